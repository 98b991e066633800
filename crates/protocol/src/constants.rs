/// Route the master exposes for artifact uploads.
pub const UPLOAD_PATH: &str = "/upload";

/// Health route on the compile service. Case matters.
pub const PING_PATH: &str = "Ping";

/// Multipart text field carrying the artifact kind.
pub const FIELD_KIND: &str = "kind";

/// Multipart file field carrying the uploaded artifact.
pub const FIELD_FILE: &str = "file";

/// Multipart file field for the generated model class sent to the compile service.
pub const FIELD_POJO: &str = "pojo";

/// Multipart file field for the companion runtime archive.
pub const FIELD_JAR: &str = "jar";

/// Directory under the working directory that holds stored artifacts.
pub const LIB_DIR: &str = "lib";
