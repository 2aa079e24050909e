//! A ready-made approval handler.

use async_trait::async_trait;
use codex_client::{HandlerError, ServerRequestHandler};
use codex_protocol::types::{
    ApplyPatchApprovalParams, ApprovalResponse, CommandExecutionRequestApprovalParams,
    ExecCommandApprovalParams, FileChangeRequestApprovalParams, ToolRequestUserInputParams,
    ToolRequestUserInputResponse,
};
use tracing::info;

/// Approves every command and file change the app-server asks about.
///
/// Tool user-input prompts need a real answer and are refused. Every decision
/// is logged at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApproveHandler;

#[async_trait]
impl ServerRequestHandler for AutoApproveHandler {
    async fn command_execution_request_approval(
        &self,
        params: CommandExecutionRequestApprovalParams,
    ) -> Result<ApprovalResponse, HandlerError> {
        info!(
            thread_id = %params.thread_id,
            turn_id = %params.turn_id,
            item_id = %params.item_id,
            command = ?params.command,
            cwd = ?params.cwd,
            "auto-approving command execution"
        );
        Ok(ApprovalResponse::accept())
    }

    async fn file_change_request_approval(
        &self,
        params: FileChangeRequestApprovalParams,
    ) -> Result<ApprovalResponse, HandlerError> {
        info!(
            thread_id = %params.thread_id,
            turn_id = %params.turn_id,
            item_id = %params.item_id,
            grant_root = ?params.grant_root,
            "auto-approving file change"
        );
        Ok(ApprovalResponse::accept())
    }

    async fn tool_request_user_input(
        &self,
        params: ToolRequestUserInputParams,
    ) -> Result<ToolRequestUserInputResponse, HandlerError> {
        info!(
            thread_id = %params.thread_id,
            item_id = %params.item_id,
            questions = params.questions.len(),
            "cannot answer tool user input"
        );
        Err(HandlerError::failed("tool user input requires a custom handler"))
    }

    async fn apply_patch_approval(
        &self,
        params: ApplyPatchApprovalParams,
    ) -> Result<ApprovalResponse, HandlerError> {
        info!(
            conversation_id = %params.conversation_id,
            call_id = %params.call_id,
            file_changes = params.file_changes.len(),
            "auto-approving patch"
        );
        Ok(ApprovalResponse::approved())
    }

    async fn exec_command_approval(
        &self,
        params: ExecCommandApprovalParams,
    ) -> Result<ApprovalResponse, HandlerError> {
        info!(
            conversation_id = %params.conversation_id,
            call_id = %params.call_id,
            command = ?params.command,
            cwd = %params.cwd,
            "auto-approving command"
        );
        Ok(ApprovalResponse::approved())
    }
}
