//! Tool registry and dispatcher.
//!
//! Every tool is registered once in [`ToolRegistry::new`] with its
//! definition (name, description, input schema) and a handler. A handler
//! decodes its typed input, validates it, calls the [`SpringIoClient`] and
//! returns the records as JSON. Errors are passed through unchanged.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::mcp::protocol::ToolDefinition;
use crate::springio::{CalendarWindow, SpringIoClient, SpringIoError, SpringIoResult};

/// Tool name: releases of a project.
pub const GET_PROJECT_RELEASES: &str = "getProjectReleases";

/// Tool name: support generations of a project.
pub const GET_PROJECT_SUPPORT_DATES: &str = "getProjectSupportDates";

/// Tool name: calendar entries in the coming days.
pub const GET_UPCOMING_RELEASES: &str = "getUpcomingReleases";

/// Boxed future returned by a tool handler.
pub type ToolFuture = Pin<Box<dyn Future<Output = SpringIoResult<Value>> + Send>>;

type ToolHandler = Box<dyn Fn(Arc<SpringIoClient>, Value) -> ToolFuture + Send + Sync>;

struct RegisteredTool {
    definition: ToolDefinition,
    handler: ToolHandler,
}

/// Input of the project-scoped tools.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectInput {
    /// Project slug, e.g. `spring-boot`.
    #[serde(alias = "springProjectId")]
    pub project_id: String,
}

/// Input of the upcoming releases tool.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpcomingInput {
    /// Days to look ahead; the configured default when absent.
    #[serde(default)]
    pub window_days: Option<u32>,
}

/// Name-to-handler map for the exposed tools.
pub struct ToolRegistry {
    client: Arc<SpringIoClient>,
    tools: IndexMap<&'static str, RegisteredTool>,
}

impl ToolRegistry {
    /// Builds the registry with every tool this server exposes.
    ///
    /// `default_window_days` is used by [`GET_UPCOMING_RELEASES`] when the
    /// caller gives no window.
    #[must_use]
    pub fn new(client: SpringIoClient, default_window_days: u32) -> Self {
        let mut registry = Self {
            client: Arc::new(client),
            tools: IndexMap::new(),
        };

        registry.register(
            ToolDefinition {
                name: GET_PROJECT_RELEASES,
                description: "Get information about Spring project releases: every published \
                              version with its status (GA, SNAPSHOT, PRERELEASE) and whether \
                              it is the current release.",
                input_schema: project_schema(),
            },
            |client, arguments| Box::pin(project_releases(client, arguments)),
        );

        registry.register(
            ToolDefinition {
                name: GET_PROJECT_SUPPORT_DATES,
                description: "Get information about support ranges and dates for Spring \
                              projects: for each release line, the initial release date and the \
                              end of open-source and commercial support.",
                input_schema: project_schema(),
            },
            |client, arguments| Box::pin(project_support_dates(client, arguments)),
        );

        registry.register(
            ToolDefinition {
                name: GET_UPCOMING_RELEASES,
                description: "Get information about upcoming releases for Spring projects from \
                              the Spring release calendar, starting today.",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "windowDays": {
                            "type": "integer",
                            "minimum": 1,
                            "maximum": crate::config::MAX_WINDOW_DAYS,
                            "description": format!(
                                "Optional: number of days to look ahead (default: {default_window_days})"
                            )
                        }
                    }
                }),
            },
            move |client, arguments| {
                Box::pin(upcoming_releases(client, arguments, default_window_days))
            },
        );

        registry
    }

    fn register<F>(&mut self, definition: ToolDefinition, handler: F)
    where
        F: Fn(Arc<SpringIoClient>, Value) -> ToolFuture + Send + Sync + 'static,
    {
        self.tools.insert(
            definition.name,
            RegisteredTool {
                definition,
                handler: Box::new(handler),
            },
        );
    }

    /// Returns the tool definitions in registration order.
    pub fn definitions(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values().map(|tool| &tool.definition)
    }

    /// Returns `true` if a tool with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Starts a tool invocation.
    ///
    /// Returns `None` for an unknown tool. The returned future owns
    /// everything it needs and can be spawned.
    #[must_use]
    pub fn dispatch(&self, name: &str, arguments: Value) -> Option<ToolFuture> {
        self.tools
            .get(name)
            .map(|tool| (tool.handler)(Arc::clone(&self.client), arguments))
    }
}

async fn project_releases(client: Arc<SpringIoClient>, arguments: Value) -> SpringIoResult<Value> {
    let input: ProjectInput = decode_arguments(arguments)?;
    let releases = client.project_releases(&input.project_id).await?;
    Ok(json!(releases))
}

async fn project_support_dates(
    client: Arc<SpringIoClient>,
    arguments: Value,
) -> SpringIoResult<Value> {
    let input: ProjectInput = decode_arguments(arguments)?;
    let generations = client.project_generations(&input.project_id).await?;
    Ok(json!(generations))
}

async fn upcoming_releases(
    client: Arc<SpringIoClient>,
    arguments: Value,
    default_window_days: u32,
) -> SpringIoResult<Value> {
    let input: UpcomingInput = decode_arguments(arguments)?;
    let window = CalendarWindow::from_today(input.window_days.unwrap_or(default_window_days))?;
    let upcoming = client.upcoming_releases(window).await?;
    Ok(json!(upcoming))
}

fn project_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "projectId": {
                "type": "string",
                "description": "The Spring project identifier, e.g. 'spring-boot' or 'spring-framework'"
            }
        },
        "required": ["projectId"]
    })
}

/// Decodes tool arguments. A missing `arguments` object counts as `{}`.
fn decode_arguments<T: DeserializeOwned>(arguments: Value) -> SpringIoResult<T> {
    let arguments = if arguments.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        arguments
    };

    serde_json::from_value(arguments)
        .map_err(|e| SpringIoError::invalid_argument("arguments", e.to_string()))
}
