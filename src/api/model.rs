use serde::{Deserialize, Serialize, de::DeserializeOwned};

#[derive(Deserialize, Debug, Clone)]
pub struct BlueprintParams {
    pub blueprint: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ResourceParams {
    pub resource: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SetParams {
    pub resource: String,
    pub value: i64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ApiRequest<T = serde_json::Value> {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: T,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("malformed request: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("unknown method: {0}")]
    UnknownMethod(String),
    #[error("invalid params for {method}: {source}")]
    InvalidParams {
        method: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ListBlueprints,
    BlueprintDetail { blueprint: String },
    ListQueue,
    AddToQueue { blueprint: String },
    RemoveFromQueue { blueprint: String },
    ResourceTotals,
    IncrementResource { resource: String },
    DecrementResource { resource: String },
    SetResource { resource: String, value: i64 },
    ClearResource { resource: String },
    Refresh,
    About,
}

impl Command {
    pub fn parse(method: &str, params: serde_json::Value) -> Result<Self, RequestError> {
        let blueprint = |params| parse_params::<BlueprintParams>(method, params).map(|p| p.blueprint);
        let resource = |params| parse_params::<ResourceParams>(method, params).map(|p| p.resource);

        let command = match method {
            "blueprints.list" => Command::ListBlueprints,
            "blueprint.detail" => Command::BlueprintDetail {
                blueprint: blueprint(params)?,
            },
            "queue.list" => Command::ListQueue,
            "queue.add" => Command::AddToQueue {
                blueprint: blueprint(params)?,
            },
            "queue.remove" => Command::RemoveFromQueue {
                blueprint: blueprint(params)?,
            },
            "resources.totals" => Command::ResourceTotals,
            "tracker.increment" => Command::IncrementResource {
                resource: resource(params)?,
            },
            "tracker.decrement" => Command::DecrementResource {
                resource: resource(params)?,
            },
            "tracker.set" => {
                let SetParams { resource, value } = parse_params(method, params)?;
                Command::SetResource { resource, value }
            }
            "tracker.clear" => Command::ClearResource {
                resource: resource(params)?,
            },
            "data.refresh" => Command::Refresh,
            "about" => Command::About,
            other => return Err(RequestError::UnknownMethod(other.to_string())),
        };
        Ok(command)
    }

    pub fn method(&self) -> &'static str {
        match self {
            Command::ListBlueprints => "blueprints.list",
            Command::BlueprintDetail { .. } => "blueprint.detail",
            Command::ListQueue => "queue.list",
            Command::AddToQueue { .. } => "queue.add",
            Command::RemoveFromQueue { .. } => "queue.remove",
            Command::ResourceTotals => "resources.totals",
            Command::IncrementResource { .. } => "tracker.increment",
            Command::DecrementResource { .. } => "tracker.decrement",
            Command::SetResource { .. } => "tracker.set",
            Command::ClearResource { .. } => "tracker.clear",
            Command::Refresh => "data.refresh",
            Command::About => "about",
        }
    }
}

fn parse_params<T: DeserializeOwned>(method: &str, params: serde_json::Value) -> Result<T, RequestError> {
    serde_json::from_value(params).map_err(|source| RequestError::InvalidParams {
        method: method.to_string(),
        source,
    })
}

/// Decodes a text frame into its request id and command.
pub fn decode(frame: &str) -> Result<(String, Command), (String, RequestError)> {
    let request = serde_json::from_str::<ApiRequest>(frame)
        .map_err(|e| (String::new(), RequestError::Malformed(e)))?;
    let command = Command::parse(&request.method, request.params).map_err(|e| (request.id.clone(), e))?;
    Ok((request.id, command))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_commands() {
        let (id, command) = decode(r#"{"id": "1", "method": "queue.list"}"#).unwrap();
        assert_eq!(id, "1");
        assert_eq!(command, Command::ListQueue);

        let (_, command) =
            decode(r#"{"id": "2", "method": "queue.add", "params": {"blueprint": "scanner"}}"#)
                .unwrap();
        assert_eq!(
            command,
            Command::AddToQueue {
                blueprint: "scanner".to_string()
            }
        );

        let (_, command) = decode(
            r#"{"id": "3", "method": "tracker.set", "params": {"resource": "iron", "value": -2}}"#,
        )
        .unwrap();
        assert_eq!(
            command,
            Command::SetResource {
                resource: "iron".to_string(),
                value: -2
            }
        );
        assert_eq!(command.method(), "tracker.set");
    }

    #[test]
    fn test_decode_errors() {
        let (id, err) = decode("not json").unwrap_err();
        assert_eq!(id, "");
        assert!(matches!(err, RequestError::Malformed(_)));

        let (id, err) = decode(r#"{"id": "7", "method": "queue.shuffle"}"#).unwrap_err();
        assert_eq!(id, "7");
        assert!(matches!(err, RequestError::UnknownMethod(m) if m == "queue.shuffle"));

        let (_, err) = decode(r#"{"id": "8", "method": "tracker.increment"}"#).unwrap_err();
        assert!(matches!(err, RequestError::InvalidParams { .. }));

        let (_, err) = decode(
            r#"{"id": "9", "method": "tracker.set", "params": {"resource": "iron", "value": "lots"}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("invalid params for tracker.set"));
    }

    #[test]
    fn test_response_shape() {
        let ok = ApiResponse {
            id: "1".to_string(),
            result: Some(json!([])),
            error: None,
        };
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"id": "1", "result": []}));

        let err = ApiResponse {
            id: "2".to_string(),
            result: None,
            error: Some("nope".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"id": "2", "error": "nope"})
        );
    }
}
