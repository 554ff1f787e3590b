//! End-to-end sessions over an in-memory duplex channel

use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, duplex};
use toolgate_core::Dispatcher;
use toolgate_mcp::{McpServer, SessionEnd, StdioConfig};
use toolgate_testing::{MockTool, dispatcher_with};

fn report_dispatcher() -> Dispatcher {
    Dispatcher::new(Arc::new(toolgate_tools::default_registry().unwrap()))
}

/// Feed `input` to a server, close the input, and collect every output line.
async fn run_session(server: McpServer, input: impl AsRef<[u8]>) -> (SessionEnd, Vec<Value>) {
    let (mut client_in, server_in) = duplex(64 * 1024);
    let (server_out, client_out) = duplex(64 * 1024);

    client_in.write_all(input.as_ref()).await.unwrap();
    drop(client_in);

    let end = server
        .serve(server_in, server_out, std::future::pending())
        .await
        .unwrap();

    let mut lines = BufReader::new(client_out).lines();
    let mut responses = Vec::new();
    while let Some(line) = lines.next_line().await.unwrap() {
        responses.push(serde_json::from_str(&line).unwrap());
    }
    (end, responses)
}

#[tokio::test]
async fn test_sample_client_session() {
    let input = [
        json!({"jsonrpc": "2.0", "id": "1", "method": "initialize", "params": {"protocolVersion": "2024-11-05", "clientInfo": {"name": "test", "version": "1.0"}}}),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        json!({"jsonrpc": "2.0", "id": "2", "method": "tools/list"}),
        json!({"jsonrpc": "2.0", "id": "3", "method": "tools/call", "params": {"name": "downloadReport", "arguments": {"date": "2025-12-04"}}}),
    ]
    .iter()
    .map(Value::to_string)
    .collect::<Vec<_>>()
    .join("\n");

    let (end, responses) = run_session(McpServer::new(report_dispatcher()), &input).await;

    assert_eq!(end, SessionEnd::Eof);
    assert_eq!(responses.len(), 3, "notification must not be answered");
    assert_eq!(responses[0]["id"], "1");
    assert_eq!(responses[0]["result"]["serverInfo"]["name"], "toolgate");
    assert_eq!(responses[1]["result"]["tools"][0]["name"], "downloadReport");

    let call = &responses[2]["result"];
    assert_eq!(call["isError"], false);
    assert_eq!(call["content"][0]["type"], "file");
    assert_eq!(call["content"][0]["file"]["name"], "report-2025-12-04.csv");
    assert_eq!(call["content"][0]["file"]["encoding"], "base64");
    assert_eq!(call["content"][1]["type"], "text");
}

#[tokio::test]
async fn test_malformed_lines_do_not_end_session() {
    let input = "{oops\n\n{\"jsonrpc\":\"2.0\",\"id\":9,\"method\":\"ping\"}\n";
    let (end, responses) = run_session(McpServer::new(report_dispatcher()), input).await;

    assert_eq!(end, SessionEnd::Eof);
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["error"]["code"], -32700);
    assert_eq!(responses[0]["id"], Value::Null);
    assert_eq!(responses[1]["id"], 9);
    assert_eq!(responses[1]["result"], json!({}));
}

#[tokio::test]
async fn test_invalid_utf8_line_is_rejected_and_session_continues() {
    let mut input = br#"{"jsonrpc":"2.0","id":1,"method":""#.to_vec();
    input.push(0xff);
    input.extend_from_slice(b"\"}\n");
    input.extend_from_slice(br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#);
    input.push(b'\n');

    let (end, responses) = run_session(McpServer::new(report_dispatcher()), input).await;

    assert_eq!(end, SessionEnd::Eof);
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["error"]["code"], -32700);
    assert_eq!(responses[0]["id"], Value::Null);
    assert_eq!(responses[1]["id"], 2);
    assert_eq!(responses[1]["result"], json!({}));
}

#[tokio::test]
async fn test_oversized_line_is_rejected_and_session_continues() {
    let server = McpServer::new(report_dispatcher()).with_config(StdioConfig {
        max_line_bytes: 256,
        ..StdioConfig::default()
    });
    let padding = "x".repeat(4096);
    let input = format!(
        "{{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\",\"params\":{{\"pad\":\"{padding}\"}}}}\n\
         {{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}}\n"
    );

    let (end, responses) = run_session(server, input).await;

    assert_eq!(end, SessionEnd::Eof);
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["error"]["code"], -32600);
    assert_eq!(responses[0]["id"], Value::Null);
    assert_eq!(responses[1]["id"], 2);
}

#[tokio::test]
async fn test_sequential_mode_preserves_request_order() {
    let dispatcher = dispatcher_with([
        MockTool::slow("slow", Duration::from_millis(50)),
        MockTool::echo("fast"),
    ]);
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"slow","arguments":{"message":"a"}}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"fast","arguments":{"message":"b"}}}"#,
        "\n",
    );

    let (_, responses) = run_session(McpServer::new(dispatcher), input).await;
    let ids: Vec<_> = responses.iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, [json!(1), json!(2)]);
}

#[tokio::test]
async fn test_concurrent_mode_correlates_by_id() {
    let dispatcher = dispatcher_with([
        MockTool::slow("slow", Duration::from_millis(200)),
        MockTool::echo("fast"),
    ]);
    let server = McpServer::new(dispatcher).with_config(StdioConfig {
        max_in_flight: 4,
        ..StdioConfig::default()
    });
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":"a","method":"tools/call","params":{"name":"slow","arguments":{"message":"slow"}}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":"b","method":"tools/call","params":{"name":"fast","arguments":{"message":"fast"}}}"#,
        "\n",
    );

    let (end, responses) = run_session(server, input).await;

    assert_eq!(end, SessionEnd::Eof);
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], "b", "fast call should finish first");
    for response in &responses {
        let id = response["id"].as_str().unwrap();
        let expected = if id == "a" { "slow" } else { "fast" };
        assert_eq!(response["result"]["content"][0]["text"], expected);
    }
}

#[tokio::test]
async fn test_shutdown_stops_session() {
    let server = McpServer::new(report_dispatcher());
    let (_client_in, server_in) = duplex(1024);
    let (server_out, _client_out) = duplex(1024);

    let end = tokio::time::timeout(
        Duration::from_secs(5),
        server.serve(server_in, server_out, tokio::time::sleep(Duration::from_millis(20))),
    )
    .await
    .expect("session should stop on shutdown")
    .unwrap();

    assert_eq!(end, SessionEnd::Shutdown);
}

#[tokio::test]
async fn test_panicking_tool_does_not_break_session() {
    let echo = MockTool::echo("echo");
    let dispatcher = dispatcher_with([MockTool::panicking("boom", "kaboom"), echo.clone()]);
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"boom"}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"echo","arguments":{"message":"still here"}}}"#,
        "\n",
    );

    let (_, responses) = run_session(McpServer::new(dispatcher), input).await;

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["result"]["isError"], true);
    assert_eq!(responses[1]["result"]["content"][0]["text"], "still here");
    assert_eq!(echo.call_history()[0]["message"], "still here");
}
