//! Wire-level vocabulary shared by the EngineDock receiver and the compile
//! service client.
//!
//! Nothing here performs I/O: it only names the routes, multipart fields and
//! remote operations both sides agree on.

pub mod constants;
pub mod operation;

pub use constants::{
    FIELD_FILE, FIELD_JAR, FIELD_KIND, FIELD_POJO, LIB_DIR, PING_PATH, UPLOAD_PATH,
};
pub use operation::{ParseOperationError, RemoteOperation};
