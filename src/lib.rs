//! Workspace root package used only for workspace-level tooling.
