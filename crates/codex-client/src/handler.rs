//! Server-initiated requests and the handler capability that answers them.
//!
//! The app-server asks the client for approvals over the same connection. Each
//! request kind maps to one [`ServerRequestHandler`] method; dispatch decodes
//! the params, invokes the method and encodes the response or a JSON-RPC error.

use std::fmt::Debug;

use async_trait::async_trait;
use codex_protocol::jsonrpc::JsonRpcError;
use codex_protocol::methods;
use codex_protocol::types::{
    ApplyPatchApprovalParams, ApplyPatchApprovalResponse, CommandExecutionRequestApprovalParams,
    CommandExecutionRequestApprovalResponse, ExecCommandApprovalParams, ExecCommandApprovalResponse,
    FileChangeRequestApprovalParams, FileChangeRequestApprovalResponse, ToolRequestUserInputParams,
    ToolRequestUserInputResponse,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::HandlerError;

/// Answers approval and input requests sent by the app-server.
///
/// Every method defaults to [`HandlerError::NotImplemented`], which the client
/// reports to the peer as "method not found".
#[async_trait]
pub trait ServerRequestHandler: Send + Sync + Debug {
    /// `item/commandExecution/requestApproval`
    async fn command_execution_request_approval(
        &self,
        params: CommandExecutionRequestApprovalParams,
    ) -> Result<CommandExecutionRequestApprovalResponse, HandlerError> {
        let _ = params;
        Err(HandlerError::NotImplemented(
            methods::ITEM_COMMAND_EXECUTION_REQUEST_APPROVAL.to_string(),
        ))
    }

    /// `item/fileChange/requestApproval`
    async fn file_change_request_approval(
        &self,
        params: FileChangeRequestApprovalParams,
    ) -> Result<FileChangeRequestApprovalResponse, HandlerError> {
        let _ = params;
        Err(HandlerError::NotImplemented(
            methods::ITEM_FILE_CHANGE_REQUEST_APPROVAL.to_string(),
        ))
    }

    /// `item/tool/requestUserInput`
    async fn tool_request_user_input(
        &self,
        params: ToolRequestUserInputParams,
    ) -> Result<ToolRequestUserInputResponse, HandlerError> {
        let _ = params;
        Err(HandlerError::NotImplemented(
            methods::ITEM_TOOL_REQUEST_USER_INPUT.to_string(),
        ))
    }

    /// `applyPatchApproval`
    async fn apply_patch_approval(
        &self,
        params: ApplyPatchApprovalParams,
    ) -> Result<ApplyPatchApprovalResponse, HandlerError> {
        let _ = params;
        Err(HandlerError::NotImplemented(
            methods::APPLY_PATCH_APPROVAL.to_string(),
        ))
    }

    /// `execCommandApproval`
    async fn exec_command_approval(
        &self,
        params: ExecCommandApprovalParams,
    ) -> Result<ExecCommandApprovalResponse, HandlerError> {
        let _ = params;
        Err(HandlerError::NotImplemented(
            methods::EXEC_COMMAND_APPROVAL.to_string(),
        ))
    }
}

/// A decoded server-initiated request.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerRequest {
    /// `item/commandExecution/requestApproval`
    CommandExecutionRequestApproval(CommandExecutionRequestApprovalParams),
    /// `item/fileChange/requestApproval`
    FileChangeRequestApproval(FileChangeRequestApprovalParams),
    /// `item/tool/requestUserInput`
    ToolRequestUserInput(ToolRequestUserInputParams),
    /// `applyPatchApproval`
    ApplyPatchApproval(ApplyPatchApprovalParams),
    /// `execCommandApproval`
    ExecCommandApproval(ExecCommandApprovalParams),
}

impl ServerRequest {
    /// Decode by exact method name. `Ok(None)` for methods outside the set.
    ///
    /// # Errors
    ///
    /// The params do not match the shape for `method`.
    pub fn parse(method: &str, params: Option<Value>) -> Result<Option<Self>, serde_json::Error> {
        let request = match method {
            methods::ITEM_COMMAND_EXECUTION_REQUEST_APPROVAL => {
                Self::CommandExecutionRequestApproval(decode(params)?)
            }
            methods::ITEM_FILE_CHANGE_REQUEST_APPROVAL => {
                Self::FileChangeRequestApproval(decode(params)?)
            }
            methods::ITEM_TOOL_REQUEST_USER_INPUT => Self::ToolRequestUserInput(decode(params)?),
            methods::APPLY_PATCH_APPROVAL => Self::ApplyPatchApproval(decode(params)?),
            methods::EXEC_COMMAND_APPROVAL => Self::ExecCommandApproval(decode(params)?),
            _ => return Ok(None),
        };
        Ok(Some(request))
    }

    /// Wire method name
    pub fn method(&self) -> &'static str {
        match self {
            Self::CommandExecutionRequestApproval(_) => {
                methods::ITEM_COMMAND_EXECUTION_REQUEST_APPROVAL
            }
            Self::FileChangeRequestApproval(_) => methods::ITEM_FILE_CHANGE_REQUEST_APPROVAL,
            Self::ToolRequestUserInput(_) => methods::ITEM_TOOL_REQUEST_USER_INPUT,
            Self::ApplyPatchApproval(_) => methods::APPLY_PATCH_APPROVAL,
            Self::ExecCommandApproval(_) => methods::EXEC_COMMAND_APPROVAL,
        }
    }

    /// Invoke the matching handler method and encode its response.
    pub async fn invoke(self, handler: &dyn ServerRequestHandler) -> Result<Value, DispatchError> {
        match self {
            Self::CommandExecutionRequestApproval(p) => {
                encode(handler.command_execution_request_approval(p).await?)
            }
            Self::FileChangeRequestApproval(p) => {
                encode(handler.file_change_request_approval(p).await?)
            }
            Self::ToolRequestUserInput(p) => encode(handler.tool_request_user_input(p).await?),
            Self::ApplyPatchApproval(p) => encode(handler.apply_patch_approval(p).await?),
            Self::ExecCommandApproval(p) => encode(handler.exec_command_approval(p).await?),
        }
    }
}

/// Why a server request could not be answered with a result.
#[derive(Debug)]
pub enum DispatchError {
    /// The method is outside the known set
    UnknownMethod(String),
    /// The params did not decode
    InvalidParams(serde_json::Error),
    /// The handler returned an error
    Handler(HandlerError),
    /// The handler's response did not encode
    Encode(serde_json::Error),
}

impl From<HandlerError> for DispatchError {
    fn from(e: HandlerError) -> Self {
        Self::Handler(e)
    }
}

impl DispatchError {
    /// The JSON-RPC error sent back to the peer.
    pub fn to_rpc_error(&self) -> JsonRpcError {
        match self {
            Self::UnknownMethod(method) | Self::Handler(HandlerError::NotImplemented(method)) => {
                JsonRpcError::method_not_found(method)
            }
            Self::InvalidParams(e) => JsonRpcError::invalid_params(e.to_string()),
            Self::Handler(HandlerError::Failed(message)) => {
                JsonRpcError::invalid_params(message.clone())
            }
            Self::Encode(e) => {
                JsonRpcError::internal_error(format!("failed to encode response: {e}"))
            }
        }
    }
}

/// Decode, invoke and encode one server request.
pub async fn dispatch_server_request(
    handler: &dyn ServerRequestHandler,
    method: &str,
    params: Option<Value>,
) -> Result<Value, DispatchError> {
    let request = ServerRequest::parse(method, params)
        .map_err(DispatchError::InvalidParams)?
        .ok_or_else(|| DispatchError::UnknownMethod(method.to_string()))?;
    request.invoke(handler).await
}

fn decode<T: DeserializeOwned>(params: Option<Value>) -> Result<T, serde_json::Error> {
    serde_json::from_value(params.unwrap_or_else(|| Value::Object(Map::new())))
}

fn encode<T: Serialize>(response: T) -> Result<Value, DispatchError> {
    serde_json::to_value(response).map_err(DispatchError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use codex_protocol::jsonrpc::{INVALID_PARAMS, METHOD_NOT_FOUND};
    use codex_protocol::types::ApprovalResponse;
    use serde_json::json;

    #[derive(Debug)]
    struct AcceptCommands;

    #[async_trait]
    impl ServerRequestHandler for AcceptCommands {
        async fn command_execution_request_approval(
            &self,
            params: CommandExecutionRequestApprovalParams,
        ) -> Result<CommandExecutionRequestApprovalResponse, HandlerError> {
            if params.command.as_deref() == Some("rm -rf /") {
                return Err(HandlerError::failed("refusing"));
            }
            Ok(ApprovalResponse::accept())
        }
    }

    #[tokio::test]
    async fn test_dispatch_invokes_matching_method() {
        let result = dispatch_server_request(
            &AcceptCommands,
            "item/commandExecution/requestApproval",
            Some(json!({"threadId": "t", "turnId": "u", "itemId": "i", "command": "ls"})),
        )
        .await
        .unwrap();
        assert_eq!(result, json!({"decision": "accept"}));
    }

    #[tokio::test]
    async fn test_dispatch_error_codes() {
        let err = dispatch_server_request(&AcceptCommands, "bogus/method", None)
            .await
            .unwrap_err()
            .to_rpc_error();
        assert_eq!(err.code, METHOD_NOT_FOUND);
        assert_eq!(err.message, "method not found: bogus/method");

        let err = dispatch_server_request(&AcceptCommands, "applyPatchApproval", None)
            .await
            .unwrap_err()
            .to_rpc_error();
        assert_eq!(err.code, METHOD_NOT_FOUND);

        let err = dispatch_server_request(
            &AcceptCommands,
            "item/commandExecution/requestApproval",
            Some(json!({"command": "rm -rf /"})),
        )
        .await
        .unwrap_err()
        .to_rpc_error();
        assert_eq!(err.code, INVALID_PARAMS);
        assert_eq!(err.message, "refusing");

        let err = dispatch_server_request(
            &AcceptCommands,
            "item/commandExecution/requestApproval",
            Some(json!({"threadId": 12})),
        )
        .await
        .unwrap_err()
        .to_rpc_error();
        assert_eq!(err.code, INVALID_PARAMS);
    }

    #[test]
    fn test_parse_round_trips_method_names() {
        for method in [
            "item/commandExecution/requestApproval",
            "item/fileChange/requestApproval",
            "item/tool/requestUserInput",
            "applyPatchApproval",
            "execCommandApproval",
        ] {
            let request = ServerRequest::parse(method, Some(json!({}))).unwrap().unwrap();
            assert_eq!(request.method(), method);
        }
        assert!(ServerRequest::parse("turn/start", None).unwrap().is_none());
    }
}
