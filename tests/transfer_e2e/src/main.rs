fn main() {
    println!("Run `cargo test -p transfer-e2e` to execute the end-to-end transfer tests.");
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use axum::Router;
    use axum::extract::{Multipart, State};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use enginedock_compile::{CompileClient, CompileError};
    use enginedock_file_ops::ArtifactStore;
    use enginedock_protocol::{FIELD_JAR, FIELD_POJO, RemoteOperation, UPLOAD_PATH};
    use enginedock_receiver::{MemoryRegistry, Receiver, ReceiverConfig, TokenIdentifier};
    use reqwest::multipart::{Form, Part};
    use tokio::net::TcpListener;

    const TOKEN: &str = "e2e-token";

    /// Compile service stand-in. Stores each received part under
    /// `lib/<field name>/` and answers with a tagged copy of the POJO.
    async fn build(
        State(store): State<Arc<ArtifactStore>>,
        tag: &'static str,
        mut multipart: Multipart,
    ) -> (StatusCode, Vec<u8>) {
        let mut pojo = None;
        let mut jar_seen = false;

        while let Ok(Some(field)) = multipart.next_field().await {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().unwrap_or_default().to_string();
            let data = match field.bytes().await {
                Ok(data) => data,
                Err(e) => return (StatusCode::BAD_REQUEST, e.body_text().into_bytes()),
            };
            if let Err(e) = store.store_bytes(&name, &file_name, &data).await {
                return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string().into_bytes());
            }
            match name.as_str() {
                FIELD_POJO => pojo = Some(data),
                FIELD_JAR => jar_seen = true,
                _ => {}
            }
        }

        let Some(pojo) = pojo else {
            return (StatusCode::BAD_REQUEST, b"missing pojo".to_vec());
        };
        if !jar_seen {
            return (StatusCode::BAD_REQUEST, b"missing jar".to_vec());
        }
        if pojo.windows(6).any(|w| w == b"syntax") {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                b"Model.java:1: error: class, interface, or enum expected".to_vec(),
            );
        }

        let mut out = tag.as_bytes().to_vec();
        out.extend_from_slice(&pojo);
        (StatusCode::OK, out)
    }

    async fn start_compile_service(dir: &Path) -> (String, tokio::task::JoinHandle<()>) {
        let store = Arc::new(ArtifactStore::new(dir));
        let app = Router::new()
            .route(
                "/compile",
                post(|state: State<Arc<ArtifactStore>>, multipart: Multipart| {
                    build(state, "JAR:", multipart)
                }),
            )
            .route(
                "/makewar",
                post(|state: State<Arc<ArtifactStore>>, multipart: Multipart| {
                    build(state, "WAR:", multipart)
                }),
            )
            .route("/Ping", get(|| async { "pong" }))
            .with_state(store);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (address, handle)
    }

    async fn start_receiver(
        dir: &Path,
    ) -> (
        Arc<Receiver>,
        Arc<MemoryRegistry>,
        String,
        tokio::task::JoinHandle<()>,
    ) {
        let registry = Arc::new(MemoryRegistry::new());
        let identifier = TokenIdentifier::new([(TOKEN.to_string(), "e2e".to_string())]);
        let receiver = Receiver::new(ReceiverConfig::new(dir), identifier, Arc::clone(&registry));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}{UPLOAD_PATH}", listener.local_addr().unwrap());
        let server = Arc::clone(&receiver);
        let handle = tokio::spawn(async move {
            server.serve(listener).await.unwrap();
        });
        (receiver, registry, url, handle)
    }

    fn write_inputs(dir: &Path, pojo_source: &[u8]) -> (PathBuf, PathBuf) {
        let pojo = dir.join("model.json");
        let jar = dir.join("h2o-genmodel.jar");
        std::fs::write(&pojo, pojo_source).unwrap();
        std::fs::write(&jar, b"PK\x03\x04genmodel").unwrap();
        (pojo, jar)
    }

    async fn upload(url: &str, kind: &str, path: &Path) -> reqwest::Response {
        let data = std::fs::read(path).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let form = Form::new()
            .text("kind", kind.to_string())
            .part("file", Part::bytes(data).file_name(name));
        reqwest::Client::new()
            .post(url)
            .bearer_auth(TOKEN)
            .multipart(form)
            .send()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn compile_round_trip() {
        let work = tempfile::tempdir().unwrap();
        let service_dir = tempfile::tempdir().unwrap();
        let (pojo, jar) = write_inputs(work.path(), b"class Model {}");
        let (address, handle) = start_compile_service(service_dir.path()).await;

        let client = CompileClient::new(address).unwrap();
        client.ping().await.unwrap();

        let jar_out = client
            .compile_pojo(&pojo, &jar, RemoteOperation::Compile)
            .await
            .unwrap();
        let war_out = client
            .compile_pojo(&pojo, &jar, RemoteOperation::MakeWar)
            .await
            .unwrap();

        let dir = std::fs::canonicalize(work.path()).unwrap();
        assert_eq!(jar_out, dir.join("model.jar"));
        assert_eq!(war_out, dir.join("model.war"));
        assert_eq!(std::fs::read(&jar_out).unwrap(), b"JAR:class Model {}");
        assert_eq!(std::fs::read(&war_out).unwrap(), b"WAR:class Model {}");

        // The service side stored both parts under its own kind layout.
        let lib = service_dir.path().join("lib");
        assert_eq!(
            std::fs::read(lib.join("pojo").join("model.json")).unwrap(),
            b"class Model {}"
        );
        assert_eq!(
            std::fs::read(lib.join("jar").join("h2o-genmodel.jar")).unwrap(),
            b"PK\x03\x04genmodel"
        );

        handle.abort();
    }

    #[tokio::test]
    async fn compile_failure_surfaces_diagnostics() {
        let work = tempfile::tempdir().unwrap();
        let service_dir = tempfile::tempdir().unwrap();
        let (pojo, jar) = write_inputs(work.path(), b"syntax error here");
        let (address, handle) = start_compile_service(service_dir.path()).await;

        let client = CompileClient::new(address).unwrap();
        let err = client
            .compile_pojo(&pojo, &jar, RemoteOperation::Compile)
            .await
            .unwrap_err();

        let msg = err.to_string();
        assert!(matches!(err, CompileError::Remote { .. }));
        assert!(msg.contains("422 Unprocessable Entity"), "got: {msg}");
        assert!(
            msg.contains("class, interface, or enum expected"),
            "got: {msg}"
        );
        assert!(!work.path().join("model.jar").exists());

        handle.abort();
    }

    #[tokio::test]
    async fn compiled_engine_is_uploaded_to_master() {
        let work = tempfile::tempdir().unwrap();
        let service_dir = tempfile::tempdir().unwrap();
        let master_dir = tempfile::tempdir().unwrap();
        let (pojo, jar) = write_inputs(work.path(), b"class Model {}");
        let (address, service) = start_compile_service(service_dir.path()).await;
        let (receiver, registry, url, server) = start_receiver(master_dir.path()).await;

        let client = CompileClient::new(address).unwrap();
        let built = client
            .compile_pojo(&pojo, &jar, RemoteOperation::Compile)
            .await
            .unwrap();

        let resp = upload(&url, "engine", &built).await;
        assert_eq!(resp.status().as_u16(), 200);

        let stored = master_dir.path().join("lib").join("engine").join("model.jar");
        assert_eq!(
            std::fs::read(&stored).unwrap(),
            std::fs::read(&built).unwrap()
        );

        let engines = registry.engines().await;
        assert_eq!(engines.len(), 1);
        assert_eq!(engines[0].name, "model.jar");
        assert_eq!(engines[0].principal.name, "e2e");
        assert_eq!(engines[0].path, stored);

        receiver.shutdown();
        server.await.unwrap();
        service.abort();
    }

    #[tokio::test]
    async fn concurrent_uploads_are_isolated() {
        let work = tempfile::tempdir().unwrap();
        let master_dir = tempfile::tempdir().unwrap();
        let (receiver, registry, url, server) = start_receiver(master_dir.path()).await;

        let mut tasks = Vec::new();
        for i in 0..8u8 {
            let path = work.path().join(format!("engine-{i}.zip"));
            std::fs::write(&path, vec![i; 4096 + i as usize]).unwrap();
            let url = url.clone();
            tasks.push(tokio::spawn(async move {
                upload(&url, "engine", &path).await.status().as_u16()
            }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap(), 200);
        }

        let lib = master_dir.path().join("lib").join("engine");
        for i in 0..8u8 {
            let data = std::fs::read(lib.join(format!("engine-{i}.zip"))).unwrap();
            assert_eq!(data, vec![i; 4096 + i as usize]);
        }

        let mut ids: Vec<_> = registry.engines().await.iter().map(|e| e.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=8).collect::<Vec<_>>());

        receiver.shutdown();
        server.await.unwrap();
    }
}
