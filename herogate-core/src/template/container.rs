//! Generated container definitions.

use super::node::Node;
use super::procfile::ProcessSpec;
use crate::error::Result;
use serde::Serialize;

/// Process that receives the public port mapping.
pub const WEB_PROCESS: &str = "web";

/// Port the load balancer forwards to.
pub const WEB_PORT: u16 = 80;

/// Log group resource every container writes to.
pub const LOG_GROUP_RESOURCE: &str = "HerogateApplicationContainerLogs";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerDefinition {
    name: String,
    image: String,
    command: Vec<String>,
    environment: Node,
    port_mappings: Vec<PortMapping>,
    log_configuration: LogConfiguration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PortMapping {
    container_port: u16,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct LogConfiguration {
    log_driver: &'static str,
    options: LogOptions,
}

#[derive(Debug, Serialize)]
struct LogOptions {
    #[serde(rename = "awslogs-region")]
    region: Ref,
    #[serde(rename = "awslogs-group")]
    group: Ref,
    #[serde(rename = "awslogs-stream-prefix")]
    stream_prefix: String,
}

/// Template back-reference (`{Ref: target}`).
#[derive(Debug, Serialize)]
struct Ref {
    #[serde(rename = "Ref")]
    target: &'static str,
}

impl ContainerDefinition {
    /// Definition of one process type. `environment` is carried over verbatim.
    pub fn new(name: &str, image: &str, process: &ProcessSpec, environment: Node) -> Self {
        let port_mappings = if name == WEB_PROCESS {
            vec![PortMapping { container_port: WEB_PORT }]
        } else {
            Vec::new()
        };

        Self {
            name: name.to_string(),
            image: image.to_string(),
            command: process.command_line(),
            environment,
            port_mappings,
            log_configuration: LogConfiguration {
                log_driver: "awslogs",
                options: LogOptions {
                    region: Ref { target: "AWS::Region" },
                    group: Ref { target: LOG_GROUP_RESOURCE },
                    stream_prefix: name.to_string(),
                },
            },
        }
    }

    pub fn to_node(&self) -> Result<Node> {
        Node::from_serialize(self)
    }
}
