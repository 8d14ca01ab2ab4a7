use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use rax_file_server::Server;
use rax_file_server::config::{RuntimeConfig, ServerConfig, StartupConfig, UserRecord};

fn user(id: &str, username: &str, password: &str) -> UserRecord {
    UserRecord {
        id: id.into(),
        username: username.into(),
        password: password.into(),
        elevated: false,
    }
}

// Start a server on a free port, storing files under `root`
async fn start_test_server(root: &Path, max_clients: usize) -> SocketAddr {
    let config = ServerConfig {
        startup: StartupConfig {
            control_port: 0,
            storage_root: root.join("uploads").to_string_lossy().into_owned(),
            ..StartupConfig::default()
        },
        runtime: RuntimeConfig {
            max_clients,
            max_upload_size_mb: 1,
        },
        users: vec![user("1", "alice", "alice123"), user("2", "bob", "bob123")],
    };

    let server = Server::new(config).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move { server.start().await });
    addr
}

struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let (read_half, writer) = TcpStream::connect(addr).await.unwrap().into_split();
        let mut client = Self {
            reader: BufReader::new(read_half),
            writer,
        };
        let greeting = client.read_line().await;
        assert!(greeting.starts_with("220 "), "{greeting}");
        client
    }

    async fn read_line(&mut self) -> String {
        let mut line = String::new();
        self.reader.read_line(&mut line).await.unwrap();
        line
    }

    // Helper to send command and read the reply line
    async fn send(&mut self, command: &str) -> String {
        self.writer
            .write_all(format!("{command}\r\n").as_bytes())
            .await
            .unwrap();
        self.read_line().await
    }

    async fn send_payload(&mut self, command: &str, payload: &[u8]) -> String {
        self.writer
            .write_all(format!("{command} {}\r\n", payload.len()).as_bytes())
            .await
            .unwrap();
        self.writer.write_all(payload).await.unwrap();
        self.read_line().await
    }

    // Send a command answered by a data reply; returns header and body
    async fn fetch(&mut self, command: &str) -> (String, Vec<u8>) {
        let header = self.send(command).await;
        assert!(header.starts_with("150 "), "{header}");
        let len: usize = header.split_whitespace().nth(1).unwrap().parse().unwrap();

        let mut body = vec![0u8; len];
        self.reader.read_exact(&mut body).await.unwrap();
        assert_eq!(self.read_line().await, "226 Transfer complete\r\n");
        (header, body)
    }

    async fn login(&mut self, username: &str, password: &str) {
        assert_eq!(
            self.send(&format!("USER {username}")).await,
            "331 Password required\r\n"
        );
        assert_eq!(
            self.send(&format!("PASS {password}")).await,
            "230 Login successful\r\n"
        );
    }

    async fn is_closed(&mut self) -> bool {
        let mut rest = Vec::new();
        matches!(self.reader.read_to_end(&mut rest).await, Ok(0))
    }
}

fn docx_bytes(dir: &Path, paragraphs: &[&str]) -> Vec<u8> {
    let path = dir.join("source.docx");
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );

    let mut writer = zip::ZipWriter::new(std::fs::File::create(&path).unwrap());
    writer
        .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap();

    std::fs::read(&path).unwrap()
}

#[tokio::test]
async fn test_file_lifecycle() {
    let temp = tempfile::tempdir().unwrap();
    let addr = start_test_server(temp.path(), 10).await;
    let mut client = TestClient::connect(addr).await;
    client.login("alice", "alice123").await;

    assert_eq!(
        client.send_payload("STOR notes.txt", b"first draft").await,
        "226 File uploaded: notes.txt\r\n"
    );

    let (_, body) = client.fetch("LIST").await;
    assert_eq!(body, br#"["notes.txt"]"#);

    let (header, body) = client.fetch("RETR notes.txt").await;
    assert_eq!(
        header,
        "150 11 text/plain attachment;filename=\"notes.txt\"\r\n"
    );
    assert_eq!(body, b"first draft");

    assert_eq!(
        client.send_payload("EDIT notes.txt", b"second draft").await,
        "250 Content saved\r\n"
    );
    let (_, body) = client.fetch("READ notes.txt").await;
    assert_eq!(body, br#"{"is_text":true,"content":"second draft"}"#);

    assert_eq!(client.send("DEL notes.txt").await, "250 File deleted\r\n");
    let (_, body) = client.fetch("LIST").await;
    assert_eq!(body, b"[]");

    assert_eq!(client.send("QUIT").await, "221 Goodbye\r\n");
    assert!(client.is_closed().await);
}

#[tokio::test]
async fn test_users_cannot_see_each_others_files() {
    let temp = tempfile::tempdir().unwrap();
    let addr = start_test_server(temp.path(), 10).await;

    let mut alice = TestClient::connect(addr).await;
    alice.login("alice", "alice123").await;
    alice.send_payload("STOR secret.txt", b"mine").await;

    let mut bob = TestClient::connect(addr).await;
    bob.login("bob", "bob123").await;

    let (_, body) = bob.fetch("LIST").await;
    assert_eq!(body, b"[]");
    assert!(bob.send("RETR secret.txt").await.starts_with("550 NOT_FOUND"));
    assert!(bob.send("DEL ../1/secret.txt").await.starts_with("553 INVALID_FILENAME"));

    let (_, body) = alice.fetch("LIST").await;
    assert_eq!(body, br#"["secret.txt"]"#);
}

#[tokio::test]
async fn test_commands_before_login() {
    let temp = tempfile::tempdir().unwrap();
    let addr = start_test_server(temp.path(), 10).await;
    let mut client = TestClient::connect(addr).await;

    assert!(client.send("LIST").await.starts_with("530 NOT_LOGGED_IN"));
    assert_eq!(client.send("FROB").await, "500 Unknown command\r\n");
    assert_eq!(client.send("NOOP").await, "200 OK\r\n");
    assert!(
        client
            .send("USER mallory")
            .await
            .starts_with("530 INVALID_CREDENTIALS")
    );
}

#[tokio::test]
async fn test_rejected_upload_keeps_session_in_sync() {
    let temp = tempfile::tempdir().unwrap();
    let addr = start_test_server(temp.path(), 10).await;
    let mut client = TestClient::connect(addr).await;
    client.login("alice", "alice123").await;

    assert!(
        client
            .send_payload("STOR ../evil.txt", b"evil")
            .await
            .starts_with("553 INVALID_FILENAME")
    );
    assert_eq!(client.send("NOOP").await, "200 OK\r\n");
    assert!(!temp.path().join("uploads/evil.txt").exists());
}

#[tokio::test]
async fn test_profile_picture() {
    let temp = tempfile::tempdir().unwrap();
    let addr = start_test_server(temp.path(), 10).await;
    let mut client = TestClient::connect(addr).await;
    client.login("alice", "alice123").await;

    assert_eq!(client.send("GPIC").await, "204 No profile picture\r\n");

    assert_eq!(
        client.send_payload("SPIC avatar.png", b"\x89PNG").await,
        "226 Profile picture updated\r\n"
    );
    let (header, body) = client.fetch("GPIC").await;
    assert_eq!(header, "150 4 image/png inline\r\n");
    assert_eq!(body, b"\x89PNG");

    let (_, body) = client.fetch("LIST").await;
    assert_eq!(body, b"[]");
}

#[tokio::test]
async fn test_read_docx_content() {
    let temp = tempfile::tempdir().unwrap();
    let addr = start_test_server(temp.path(), 10).await;
    let mut client = TestClient::connect(addr).await;
    client.login("alice", "alice123").await;

    let docx = docx_bytes(temp.path(), &["Hello", "World"]);
    client.send_payload("STOR report.docx", &docx).await;

    let (_, body) = client.fetch("READ report.docx").await;
    assert_eq!(body, br#"{"is_text":true,"content":"Hello\nWorld"}"#);

    assert!(
        client
            .send_payload("EDIT report.docx", b"new")
            .await
            .starts_with("504 UNSUPPORTED_TYPE")
    );
}

#[tokio::test]
async fn test_session_limit() {
    let temp = tempfile::tempdir().unwrap();
    let addr = start_test_server(temp.path(), 1).await;

    let mut alice = TestClient::connect(addr).await;
    alice.login("alice", "alice123").await;

    let mut bob = TestClient::connect(addr).await;
    bob.send("USER bob").await;
    assert_eq!(bob.send("PASS bob123").await, "421 Too many clients\r\n");
    assert!(bob.is_closed().await);

    // Logging out frees the slot
    assert_eq!(alice.send("LOGOUT").await, "221 Logout successful\r\n");
    let mut bob = TestClient::connect(addr).await;
    bob.login("bob", "bob123").await;
}

#[tokio::test]
async fn test_oversized_payload_closes_connection() {
    let temp = tempfile::tempdir().unwrap();
    let addr = start_test_server(temp.path(), 10).await;
    let mut client = TestClient::connect(addr).await;
    client.login("alice", "alice123").await;

    let reply = client.send("STOR big.bin 2000000").await;
    assert!(reply.starts_with("552 "), "{reply}");
    assert!(client.is_closed().await);
}
