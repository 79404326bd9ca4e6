//! URL sources served from a loopback HTTP server.
#![allow(clippy::unwrap_used)]

use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use pez::source::{DocumentBuffer, USER_AGENT};
use pez::{Error, Fetch, FetchOptions, HttpFetcher, Pipeline, Query};
use pretty_assertions::assert_eq;

/// Accepts one connection, answers it with `status` and an HTML `body`, and
/// returns the request head it received.
fn serve_once(status: &'static str, body: &'static str) -> (SocketAddr, JoinHandle<String>) {
    serve_typed(status, "text/html", body.as_bytes())
}

/// Like [`serve_once`], with an explicit `Content-Type` and raw body bytes.
fn serve_typed(
    status: &'static str,
    content_type: &'static str,
    body: &'static [u8],
) -> (SocketAddr, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut head = String::new();
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                break;
            }
            head.push_str(&line);
        }
        let mut stream = stream;
        write!(
            stream,
            "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        )
        .unwrap();
        stream.write_all(body).unwrap();
        stream.flush().unwrap();
        head
    });
    (addr, handle)
}

/// A port nothing listens on.
fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(FetchOptions::default().timeout(Some(Duration::from_secs(10))))
}

#[test]
fn test_fetch_streams_body_into_buffer() {
    let (addr, server) = serve_once("200 OK", "<p>served</p>");
    let mut buffer = DocumentBuffer::new();
    fetcher()
        .fetch(&format!("http://{addr}/page.html"), &mut buffer)
        .unwrap();
    assert_eq!(buffer.as_bytes(), b"<p>served</p>");
    server.join().unwrap();
}

#[test]
fn test_fetch_sends_user_agent() {
    let (addr, server) = serve_once("200 OK", "<p>x</p>");
    let mut buffer = DocumentBuffer::new();
    fetcher()
        .fetch(&format!("http://{addr}/"), &mut buffer)
        .unwrap();
    let head = server.join().unwrap().to_ascii_lowercase();
    assert!(head.starts_with("get / http/1.1"), "{head}");
    assert!(head.contains(&format!("user-agent: {USER_AGENT}\r\n")), "{head}");
}

#[test]
fn test_error_status_body_is_still_a_document() {
    let (addr, server) = serve_once("404 Not Found", "<h1>Not Found</h1>");
    let mut out = Vec::new();
    Pipeline::with_fetcher(fetcher())
        .run(
            &Query::new("//h1/text()").source(&format!("http://{addr}/missing")),
            io::empty(),
            &mut out,
        )
        .unwrap();
    assert_eq!(out, b"Not Found\n");
    server.join().unwrap();
}

#[test]
fn test_pipeline_over_http() {
    let (addr, server) = serve_once("200 OK", "<ul><li>a</li><li>b</li></ul>");
    let mut out = Vec::new();
    Pipeline::with_fetcher(fetcher())
        .run(
            &Query::new("//li").source(&format!("http://{addr}/list")),
            io::empty(),
            &mut out,
        )
        .unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "<li>a</li>\n<li>b</li>\n");
    server.join().unwrap();
}

#[test]
fn test_fetch_records_content_type() {
    let (addr, server) = serve_typed("200 OK", "text/html; charset=utf-8", b"<p>x</p>");
    let mut buffer = DocumentBuffer::new();
    fetcher()
        .fetch(&format!("http://{addr}/"), &mut buffer)
        .unwrap();
    assert_eq!(buffer.content_type(), Some("text/html; charset=utf-8"));
    server.join().unwrap();
}

#[test]
fn test_header_charset_decodes_body() {
    let (addr, server) = serve_typed(
        "200 OK",
        "text/html; charset=ISO-8859-1",
        b"<p>na\xEFve caf\xE9</p>",
    );
    let mut out = Vec::new();
    Pipeline::with_fetcher(fetcher())
        .run(
            &Query::new("//p/text()").source(&format!("http://{addr}/latin1")),
            io::empty(),
            &mut out,
        )
        .unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "na\u{ef}ve caf\u{e9}\n");
    server.join().unwrap();
}

#[test]
fn test_connection_refused_is_source_unavailable() {
    let url = format!("http://{}/", closed_port());
    let mut out = Vec::new();
    let err = Pipeline::with_fetcher(fetcher())
        .run(&Query::new("//p").source(&url), io::empty(), &mut out)
        .unwrap_err();
    assert!(matches!(err, Error::SourceUnavailable { url: ref u, .. } if *u == url));
    assert!(out.is_empty());
}
