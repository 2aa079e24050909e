//! Method names used on the app-server wire.

/// Handshake request
pub const INITIALIZE: &str = "initialize";
/// Handshake acknowledgement notification
pub const INITIALIZED: &str = "initialized";
/// Start a new thread
pub const THREAD_START: &str = "thread/start";
/// Resume a persisted thread
pub const THREAD_RESUME: &str = "thread/resume";
/// Start a turn on a thread
pub const TURN_START: &str = "turn/start";

/// Turn began
pub const TURN_STARTED: &str = "turn/started";
/// Turn finished (possibly with `status: "failed"`)
pub const TURN_COMPLETED: &str = "turn/completed";
/// Turn failed
pub const TURN_FAILED: &str = "turn/failed";
/// An item finished
pub const ITEM_COMPLETED: &str = "item/completed";
/// Error notification
pub const ERROR: &str = "error";

/// Approve a command execution item
pub const ITEM_COMMAND_EXECUTION_REQUEST_APPROVAL: &str = "item/commandExecution/requestApproval";
/// Approve a file change item
pub const ITEM_FILE_CHANGE_REQUEST_APPROVAL: &str = "item/fileChange/requestApproval";
/// Ask the user for tool input
pub const ITEM_TOOL_REQUEST_USER_INPUT: &str = "item/tool/requestUserInput";
/// Legacy patch approval
pub const APPLY_PATCH_APPROVAL: &str = "applyPatchApproval";
/// Legacy command approval
pub const EXEC_COMMAND_APPROVAL: &str = "execCommandApproval";
