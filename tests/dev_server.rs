// tests/dev_server.rs

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use assetdag::server::{self, ReloadHub};
use assetdag_test_utils::{ProjectFixture, init_tracing, with_timeout};

/// Minimal HTTP/1.1 GET; returns the raw response.
async fn get(addr: std::net::SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

#[tokio::test]
async fn serves_site_with_reload_client_injected() {
    init_tracing();
    let project = ProjectFixture::new();
    project
        .write("site/index.html", "<html><body><h1>Hi</h1></body></html>")
        .write("site/css/main.css", ".a{color:red}");

    let listener = server::bind("127.0.0.1", 0).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = server::router(&project.path("site"), ReloadHub::new());
    tokio::spawn(server::run(listener, app));

    let page = with_timeout(5, get(addr, "/index.html")).await;
    assert!(page.starts_with("HTTP/1.1 200"), "{page}");
    assert!(
        page.contains(r#"<h1>Hi</h1><script src="/__livereload.js"></script></body>"#),
        "{page}"
    );

    let css = with_timeout(5, get(addr, "/css/main.css")).await;
    assert!(css.contains(".a{color:red}"));
    assert!(!css.contains("__livereload"));

    let script = with_timeout(5, get(addr, "/__livereload.js")).await;
    assert!(script.contains("new WebSocket"));

    let missing = with_timeout(5, get(addr, "/nope.html")).await;
    assert!(missing.starts_with("HTTP/1.1 404"), "{missing}");
}

#[tokio::test]
async fn busy_port_fails_to_bind() {
    init_tracing();
    let first = server::bind("127.0.0.1", 0).await.unwrap();
    let port = first.local_addr().unwrap().port();

    assert!(server::bind("127.0.0.1", port).await.is_err());
}
