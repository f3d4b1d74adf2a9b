//! End-to-end checks against a local mock server: table-lifecycle
//! sequencing (P5) and the auto-reconnect path (spec.md §4.5/§6, §8
//! scenario 5). These exercise `ExmdbClient`/`ExmdbQueries` the way a
//! real exmdb server would be driven, over a plain `TcpListener` rather
//! than a live store.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

use exmdb::{ExmdbClient, ExmdbQueries};
use exmdb_proto::io_buffer::IoBuffer;
use exmdb_proto::requests::opcode;

fn read_one_request(stream: &mut TcpStream) -> Vec<u8> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).unwrap();
    let len = u32::from_le_bytes(len_buf) as usize;
    let mut body = vec![0u8; len];
    stream.read_exact(&mut body).unwrap();
    body
}

fn reply(stream: &mut TcpStream, status: u8, body: &[u8]) {
    let mut header = vec![status];
    header.extend_from_slice(&(body.len() as u32).to_le_bytes());
    stream.write_all(&header).unwrap();
    stream.write_all(body).unwrap();
}

fn load_table_response(table_id: u32, row_count: u32) -> Vec<u8> {
    let mut buf = IoBuffer::new();
    buf.push_u32(table_id);
    buf.push_u32(row_count);
    buf.into_vec()
}

fn query_table_response_empty() -> Vec<u8> {
    let mut buf = IoBuffer::new();
    buf.push_u32(0); // no rows
    buf.into_vec()
}

/// `list_folders` opens a hierarchy table, queries it, then unloads it —
/// exactly once each, in that order — even when it has nothing to
/// return.
#[test]
fn list_folders_follows_load_query_unload_sequence() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();

        let connect_body = read_one_request(&mut stream);
        assert_eq!(connect_body[0], opcode::CONNECT);
        reply(&mut stream, 0, &[]);

        let load_body = read_one_request(&mut stream);
        assert_eq!(load_body[0], opcode::LOAD_HIERARCHY_TABLE);
        reply(&mut stream, 0, &load_table_response(3, 0));

        let query_body = read_one_request(&mut stream);
        assert_eq!(query_body[0], opcode::QUERY_TABLE);
        reply(&mut stream, 0, &query_table_response_empty());

        let unload_body = read_one_request(&mut stream);
        assert_eq!(unload_body[0], opcode::UNLOAD_TABLE);
        reply(&mut stream, 0, &[]);
    });

    let client = ExmdbClient::builder("127.0.0.1", port, "exmdb", true).connect().unwrap();
    let mut queries = ExmdbQueries::new(client);

    let result = queries.list_folders("homedir", 1, false, &[], 0, 0, None).unwrap();
    assert!(result.folders.is_empty());

    server.join().unwrap();
}

/// When `QueryTable` itself fails, the table is still unloaded before
/// the error is returned to the caller (P5 holds on the error path,
/// not just the success path).
#[test]
fn list_folders_unloads_table_even_when_query_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();

        read_one_request(&mut stream); // Connect
        reply(&mut stream, 0, &[]);

        read_one_request(&mut stream); // LoadHierarchyTable
        reply(&mut stream, 0, &load_table_response(9, 0));

        read_one_request(&mut stream); // QueryTable
        reply(&mut stream, 1, &[]); // AccessDeny

        let unload_body = read_one_request(&mut stream); // UnloadTable must still arrive
        assert_eq!(unload_body[0], opcode::UNLOAD_TABLE);
        reply(&mut stream, 0, &[]);
    });

    let client = ExmdbClient::builder("127.0.0.1", port, "exmdb", true).connect().unwrap();
    let mut queries = ExmdbQueries::new(client);

    let err = queries.list_folders("homedir", 1, false, &[], 0, 0, None).unwrap_err();
    assert!(format!("{err}").contains("Access Denied"));

    server.join().unwrap();
}

/// A `DISPATCH_ERROR` response with `AUTO_RECONNECT` set triggers one
/// silent reconnect (a fresh `Connect` on a new socket) before the
/// original error is handed back to the caller.
#[test]
fn dispatch_error_triggers_one_silent_reconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = thread::spawn(move || {
        let (mut first, _) = listener.accept().unwrap();
        read_one_request(&mut first); // Connect
        reply(&mut first, 0, &[]);
        read_one_request(&mut first); // Ping
        reply(&mut first, 8, &[]); // DispatchError

        // The client should dial a second connection and re-issue Connect.
        let (mut second, _) = listener.accept().unwrap();
        read_one_request(&mut second);
        reply(&mut second, 0, &[]);
    });

    let mut client = ExmdbClient::builder("127.0.0.1", port, "exmdb", true)
        .auto_reconnect()
        .connect()
        .unwrap();
    assert_eq!(client.params().port, port);

    let err = client.ping().unwrap_err();
    assert!(format!("{err}").contains("Dispatch Error"));
    assert!(client.is_connected());

    server.join().unwrap();
}

/// Without `AUTO_RECONNECT`, a dispatch error is surfaced with no
/// reconnect attempt.
#[test]
fn dispatch_error_without_auto_reconnect_flag_does_not_reconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_one_request(&mut stream); // Connect
        reply(&mut stream, 0, &[]);
        read_one_request(&mut stream); // Ping
        reply(&mut stream, 8, &[]); // DispatchError
        // No second accept: a reconnect attempt here would hang the test.
    });

    let mut client = ExmdbClient::builder("127.0.0.1", port, "exmdb", true).connect().unwrap();

    let err = client.ping().unwrap_err();
    assert!(format!("{err}").contains("Dispatch Error"));

    server.join().unwrap();
}
