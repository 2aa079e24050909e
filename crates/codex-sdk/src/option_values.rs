//! Well-known values for the any-typed thread and turn options.
//!
//! Each option also accepts arbitrary JSON, so these are plain string
//! constants rather than enums.

/// Never ask for approval
pub const APPROVAL_POLICY_NEVER: &str = "never";
/// Ask only after a sandboxed command fails
pub const APPROVAL_POLICY_ON_FAILURE: &str = "on-failure";
/// Let the model decide when to ask
pub const APPROVAL_POLICY_ON_REQUEST: &str = "on-request";
/// Ask for anything outside the trusted command set
pub const APPROVAL_POLICY_UNTRUSTED: &str = "untrusted";

/// Read-only filesystem sandbox
pub const SANDBOX_MODE_READ_ONLY: &str = "read-only";
/// Writes allowed inside the workspace
pub const SANDBOX_MODE_WORKSPACE_WRITE: &str = "workspace-write";
/// No sandbox
pub const SANDBOX_MODE_DANGER_FULL_ACCESS: &str = "danger-full-access";

#[allow(missing_docs)]
pub const REASONING_EFFORT_NONE: &str = "none";
#[allow(missing_docs)]
pub const REASONING_EFFORT_MINIMAL: &str = "minimal";
#[allow(missing_docs)]
pub const REASONING_EFFORT_LOW: &str = "low";
#[allow(missing_docs)]
pub const REASONING_EFFORT_MEDIUM: &str = "medium";
#[allow(missing_docs)]
pub const REASONING_EFFORT_HIGH: &str = "high";
#[allow(missing_docs)]
pub const REASONING_EFFORT_XHIGH: &str = "xhigh";
