//! MCP server for Spring project information.
//!
//! This module implements the MCP server lifecycle:
//!
//! 1. **Initialisation**: Capability negotiation and version agreement
//! 2. **Operation**: Handling tool calls and other requests
//! 3. **Shutdown**: Graceful connection termination
//!
//! Tool calls run as separate tasks so a slow upstream never holds up
//! other requests. Everything else is answered inline.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::mcp::protocol::{
    parse_message, ErrorCode, IncomingMessage, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcErrorData, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RequestId,
    ServerCapabilities, ServerInfo, ToolCallParams, ToolCallResult, ToolCapabilities,
    MCP_PROTOCOL_VERSION,
};
use crate::mcp::tools::ToolRegistry;
use crate::mcp::transport::{spawn_writer, LineReader, MessageSink};

/// Usage hint returned from `initialize`.
const INSTRUCTIONS: &str = "Query Spring project metadata from spring.io. \
    getProjectReleases and getProjectSupportDates take a project id such as \
    'spring-boot'; getUpcomingReleases lists the release calendar.";

/// Server state in the MCP lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for initialize request.
    AwaitingInit,
    /// Initialize received, waiting for initialized notification.
    Initialising,
    /// Ready for normal operation.
    Running,
    /// Shutdown in progress.
    ShuttingDown,
}

/// What woke up the main loop.
enum Event {
    Shutdown,
    CallFinished(Result<(), JoinError>),
    Line(io::Result<Option<String>>),
}

/// The MCP server.
pub struct McpServer {
    /// Current server state.
    state: ServerState,
    /// Negotiated protocol version (set after initialisation).
    protocol_version: Option<String>,
    /// Registered tools.
    registry: Arc<ToolRegistry>,
    /// Tool calls that have not finished yet.
    in_flight: JoinSet<()>,
}

impl McpServer {
    /// Creates a new MCP server exposing the given tools.
    #[must_use]
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            state: ServerState::AwaitingInit,
            protocol_version: None,
            registry: Arc::new(registry),
            in_flight: JoinSet::new(),
        }
    }

    /// Returns the current server state.
    #[must_use]
    pub const fn state(&self) -> ServerState {
        self.state
    }

    /// Returns the negotiated protocol version, once initialised.
    #[must_use]
    pub fn protocol_version(&self) -> Option<&str> {
        self.protocol_version.as_deref()
    }

    /// Runs the server on stdio until EOF or a termination signal.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn run(&mut self) -> io::Result<()> {
        self.serve(LineReader::stdin(), tokio::io::stdout(), shutdown_signal())
            .await
    }

    /// Runs the main loop over an arbitrary reader and writer.
    ///
    /// Stops on end of input, on a read error, or when `shutdown` completes.
    /// Tool calls still running at that point are awaited before the writer
    /// is closed.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing fails.
    pub async fn serve<R, W, S>(
        &mut self,
        mut reader: LineReader<R>,
        writer: W,
        shutdown: S,
    ) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
        S: Future<Output = ()>,
    {
        let (sink, writer_task) = spawn_writer(writer);
        tokio::pin!(shutdown);

        let result = loop {
            match self.next_event(&mut reader, &mut shutdown).await {
                Event::Shutdown => break Ok(()),
                Event::CallFinished(joined) => log_join(joined),
                Event::Line(Ok(Some(line))) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if let Err(e) = self.handle_line(&line, &sink) {
                        break Err(e);
                    }
                }
                Event::Line(Ok(None)) => {
                    debug!("Input closed");
                    break Ok(());
                }
                Event::Line(Err(e)) => break Err(e),
            }
        };

        self.state = ServerState::ShuttingDown;

        // Each remaining call is bounded by the HTTP client timeout.
        if !self.in_flight.is_empty() {
            info!(pending = self.in_flight.len(), "Waiting for in-flight tool calls");
        }
        while let Some(joined) = self.in_flight.join_next().await {
            log_join(joined);
        }

        drop(sink);
        let written = writer_task.await.map_err(io::Error::other)?;

        result.and(written)
    }

    /// Waits for the next input line, a finished tool call, or shutdown.
    ///
    /// Finished calls are collected as they complete, also while the
    /// connection is idle.
    async fn next_event<R, S>(
        &mut self,
        reader: &mut LineReader<R>,
        shutdown: &mut Pin<&mut S>,
    ) -> Event
    where
        R: AsyncBufRead + Unpin,
        S: Future<Output = ()>,
    {
        tokio::select! {
            () = shutdown.as_mut() => Event::Shutdown,
            Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                Event::CallFinished(joined)
            }
            line = reader.read_line() => Event::Line(line),
        }
    }

    /// Handles a single line of input.
    fn handle_line(&mut self, line: &str, sink: &MessageSink) -> io::Result<()> {
        match parse_message(line) {
            Ok(IncomingMessage::Request(req)) => self.handle_request(req, sink),
            Ok(IncomingMessage::Notification(notif)) => {
                self.handle_notification(&notif);
                Ok(())
            }
            Err(error) => {
                debug!(code = error.error.code, "Rejected malformed message");
                sink.write_error(&error)
            }
        }
    }

    /// Handles an incoming request.
    fn handle_request(&mut self, req: JsonRpcRequest, sink: &MessageSink) -> io::Result<()> {
        let response = match req.method.as_str() {
            "initialize" => self.handle_initialize(&req),
            "ping" => Ok(JsonRpcResponse::success(req.id.clone(), json!({}))),
            "tools/list" => self.handle_tools_list(&req),
            "tools/call" => return self.handle_tools_call(req, sink),
            _ => Err(JsonRpcError::method_not_found(req.id.clone(), &req.method)),
        };

        match response {
            Ok(resp) => sink.write_response(&resp),
            Err(error) => sink.write_error(&error),
        }
    }

    /// Handles an incoming notification.
    fn handle_notification(&mut self, notif: &JsonRpcNotification) {
        match notif.method.as_str() {
            "notifications/initialized" if self.state == ServerState::Initialising => {
                info!("Client initialised, server running");
                self.state = ServerState::Running;
            }
            "notifications/cancelled" => {
                // Calls are bounded by the HTTP timeout; nothing to cancel early.
                debug!(params = ?notif.params, "Ignoring cancellation notice");
            }
            other => debug!(method = other, "Ignoring notification"),
        }
    }

    /// Handles the initialize request.
    fn handle_initialize(&mut self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        if self.state != ServerState::AwaitingInit {
            return Err(JsonRpcError::new(
                Some(req.id.clone()),
                JsonRpcErrorData::with_message(
                    ErrorCode::InvalidRequest,
                    "Server already initialised",
                ),
            ));
        }

        let params: InitializeParams = req.params_as("initialize")?;

        if let Some(client) = &params.client_info {
            info!(
                client = %client.name,
                client_version = client.version.as_deref().unwrap_or("unknown"),
                requested_version = %params.protocol_version,
                "Initialising session"
            );
        }
        if params.protocol_version != MCP_PROTOCOL_VERSION {
            debug!(
                requested = %params.protocol_version,
                offered = MCP_PROTOCOL_VERSION,
                "Client requested a different protocol version"
            );
        }

        self.protocol_version = Some(MCP_PROTOCOL_VERSION.to_string());
        self.state = ServerState::Initialising;

        let result = InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION,
            capabilities: ServerCapabilities {
                tools: ToolCapabilities::default(),
            },
            server_info: ServerInfo::default(),
            instructions: Some(INSTRUCTIONS),
        };

        let value = serde_json::to_value(&result)
            .map_err(|e| JsonRpcError::internal_error(req.id.clone(), e.to_string()))?;

        Ok(JsonRpcResponse::success(req.id.clone(), value))
    }

    /// Handles the tools/list request.
    fn handle_tools_list(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_initialised(&req.id)?;

        let tools: Vec<_> = self.registry.definitions().collect();

        Ok(JsonRpcResponse::success(
            req.id.clone(),
            json!({ "tools": tools }),
        ))
    }

    /// Handles the tools/call request.
    ///
    /// Known tools are spawned; the response is written when the call ends.
    fn handle_tools_call(&mut self, req: JsonRpcRequest, sink: &MessageSink) -> io::Result<()> {
        if let Err(error) = self.require_initialised(&req.id) {
            return sink.write_error(&error);
        }

        let params: ToolCallParams = match req.params_as("tool call") {
            Ok(params) => params,
            Err(error) => return sink.write_error(&error),
        };

        info!(tool = %params.name, arguments = %params.arguments, "Tool call");

        let Some(call) = self.registry.dispatch(&params.name, params.arguments) else {
            warn!(tool = %params.name, "Unknown tool");
            let result = ToolCallResult::error(format!("Unknown tool: {}", params.name));
            return match tool_response(req.id, &result) {
                Ok(response) => sink.write_response(&response),
                Err(error) => sink.write_error(&error),
            };
        };

        let sink = sink.clone();
        let id = req.id;
        let tool = params.name;

        self.in_flight.spawn(async move {
            let result = match call.await {
                Ok(value) => ToolCallResult::text(format!("{value:#}")),
                Err(e) => {
                    warn!(tool = %tool, kind = e.kind(), error = %e, "Tool call failed");
                    ToolCallResult::error(format!("{:#}", e.to_json()))
                }
            };

            let sent = match tool_response(id.clone(), &result) {
                Ok(response) => sink.write_response(&response),
                Err(error) => sink.write_error(&error),
            };
            if let Err(e) = sent {
                warn!(tool = %tool, id = %id, error = %e, "Dropping tool response");
            }
        });

        Ok(())
    }

    /// Ensures `initialize` has been handled.
    fn require_initialised(&self, id: &RequestId) -> Result<(), JsonRpcError> {
        match self.state {
            ServerState::Initialising | ServerState::Running => Ok(()),
            ServerState::AwaitingInit | ServerState::ShuttingDown => Err(JsonRpcError::new(
                Some(id.clone()),
                JsonRpcErrorData::with_message(ErrorCode::InvalidRequest, "Server not initialised"),
            )),
        }
    }
}

/// Wraps a tool result in a JSON-RPC response.
fn tool_response(id: RequestId, result: &ToolCallResult) -> Result<JsonRpcResponse, JsonRpcError> {
    let value: Value = serde_json::to_value(result).map_err(|e| {
        error!(error = %e, "Failed to serialise tool call result");
        JsonRpcError::internal_error(id.clone(), "Internal error: failed to serialise result")
    })?;
    Ok(JsonRpcResponse::success(id, value))
}

fn log_join(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            error!(error = %e, "Tool call task panicked");
        }
    }
}

/// Resolves on SIGINT or SIGTERM.
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (Ok(mut sigint), Ok(mut sigterm)) = (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    ) else {
        warn!("Failed to install signal handlers, shutting down on EOF only");
        return std::future::pending().await;
    };

    tokio::select! {
        _ = sigint.recv() => info!("Received SIGINT, initiating graceful shutdown"),
        _ = sigterm.recv() => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}

/// Resolves on Ctrl+C.
#[cfg(windows)]
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl+C, initiating graceful shutdown");
    } else {
        warn!("Failed to listen for Ctrl+C, shutting down on EOF only");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::springio::SpringIoClient;
    use std::time::Duration;

    fn server() -> McpServer {
        let client = SpringIoClient::new(
            "http://127.0.0.1:9".parse().unwrap(),
            "http://127.0.0.1:9".parse().unwrap(),
            Duration::from_secs(1),
        )
        .unwrap();
        McpServer::new(ToolRegistry::new(client, 90))
    }

    fn request(id: i64, method: &str, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: RequestId::Number(id),
            method: method.to_string(),
            params,
        }
    }

    #[test]
    fn server_initial_state() {
        let server = server();
        assert_eq!(server.state(), ServerState::AwaitingInit);
        assert_eq!(server.protocol_version(), None);
    }

    #[test]
    fn initialize_moves_to_initialising() {
        let mut server = server();
        let req = request(
            1,
            "initialize",
            Some(json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "test-client", "version": "1.0.0"}
            })),
        );

        let response = server.handle_initialize(&req).unwrap();
        assert_eq!(response.result["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert_eq!(response.result["serverInfo"]["name"], "spring-io-mcp");
        assert!(response.result["capabilities"]["tools"].is_object());
        // Only tools are served; logs stay on stderr.
        assert!(response.result["capabilities"].get("logging").is_none());
        assert_eq!(server.state(), ServerState::Initialising);
        assert_eq!(server.protocol_version(), Some(MCP_PROTOCOL_VERSION));

        let again = server.handle_initialize(&req).unwrap_err();
        assert_eq!(again.error.code, ErrorCode::InvalidRequest.code());
    }

    #[test]
    fn initialize_requires_params() {
        let mut server = server();
        let err = server
            .handle_initialize(&request(1, "initialize", None))
            .unwrap_err();
        assert_eq!(err.error.code, ErrorCode::InvalidParams.code());
        assert_eq!(server.state(), ServerState::AwaitingInit);
    }

    #[test]
    fn tools_list_requires_initialize() {
        let server = server();
        let err = server
            .handle_tools_list(&request(2, "tools/list", None))
            .unwrap_err();
        assert_eq!(err.error.code, ErrorCode::InvalidRequest.code());
    }

    #[test]
    fn initialized_notification_starts_running() {
        let mut server = server();
        server.state = ServerState::Initialising;
        server.handle_notification(&JsonRpcNotification {
            jsonrpc: "2.0".to_string(),
            method: "notifications/initialized".to_string(),
            params: None,
        });
        assert_eq!(server.state(), ServerState::Running);

        let response = server
            .handle_tools_list(&request(3, "tools/list", None))
            .unwrap();
        let tools = response.result["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 3);
        assert_eq!(tools[0]["name"], "getProjectReleases");
        assert!(tools[0]["inputSchema"].is_object());
    }

    #[tokio::test]
    async fn finished_calls_are_collected_while_idle() {
        let mut server = server();
        server.in_flight.spawn(async {});

        // Input stays open and silent for the whole test.
        let (_client_end, server_end) = tokio::io::duplex(64);
        let mut reader = LineReader::new(tokio::io::BufReader::new(server_end));
        let mut shutdown = std::pin::pin!(std::future::pending::<()>());

        let event = tokio::time::timeout(
            Duration::from_secs(5),
            server.next_event(&mut reader, &mut shutdown),
        )
        .await
        .unwrap();

        assert!(matches!(event, Event::CallFinished(Ok(()))));
        assert!(server.in_flight.is_empty());
    }

    #[test]
    fn tool_response_wraps_result() {
        let response =
            tool_response(RequestId::Number(9), &ToolCallResult::error("Unknown tool: x")).unwrap();
        assert_eq!(response.result["isError"], true);
    }
}
