//! Typed wrappers over the portal remote controller's XML-RPC methods.
//!
//! Each wrapper maps one well-known remote method name to a fixed, ordered
//! parameter layout and checks the reply against that method's return
//! contract. No wrapper retries, caches, or transforms results: the value the
//! remote side sends is the value the caller gets.

use std::collections::BTreeMap;

use crate::{
    DocumentMetadata, DocumentPath, Params, Permission, PortalType, RemoteError, RpcTransport,
    Username, Value,
};

/// Remote method names as published by the portal remote controller tool.
pub mod method {
    pub const LIST_CONTENT: &str = "listContent";
    pub const GET_DOCUMENT_STATE: &str = "getDocumentState";
    pub const CREATE_DOCUMENT: &str = "createDocument";
    pub const EDIT_DOCUMENT: &str = "editDocument";
    pub const GET_DOCUMENT_HISTORY: &str = "getDocumentHistory";
    pub const IS_DOCUMENT_LOCKED: &str = "isDocumentLocked";
    pub const PUBLISH_DOCUMENT: &str = "publishDocument";
    pub const UNPUBLISH_DOCUMENT: &str = "unpublishDocument";
    pub const CHANGE_DOCUMENT_POSITION: &str = "changeDocumentPosition";
    pub const GET_ROLES: &str = "getRoles";
    pub const GET_LOCAL_ROLES: &str = "getLocalRoles";
    pub const CHECK_PERMISSION: &str = "checkPermission";
}

/// Position value asking the remote side to leave a new document where the
/// folder puts it by default (at the end).
pub const DEFAULT_POSITION: i32 = -1;

/// A client bound to one remote controller through an [`RpcTransport`].
///
/// The transport is fixed at construction and never replaced; calls are
/// issued one at a time by whoever holds the client.
#[derive(Debug, Clone)]
pub struct RemoteClient<T> {
    transport: T,
}

impl<T: RpcTransport> RemoteClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Invokes an arbitrary remote method.
    ///
    /// Emits one `info` trace event echoing the method name and parameters
    /// before the call is sent.
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RemoteError> {
        tracing::info!(method, params = %Params(&params), "Executing RPC method");
        let reply = self.transport.call(method, &params).await?;
        tracing::debug!(method, kind = reply.kind(), "RPC method returned");
        Ok(reply)
    }

    // -----------------------------------------------------------------------
    // Content
    // -----------------------------------------------------------------------

    /// Lists the documents contained in the folder at `path`.
    ///
    /// Returns the entries exactly as the remote side sent them (normally
    /// portal-relative paths such as `"workspaces/doc1"`).
    pub async fn list_content(&self, path: &DocumentPath) -> Result<Vec<Value>, RemoteError> {
        let reply = self.call(method::LIST_CONTENT, vec![path.into()]).await?;
        expect_array(method::LIST_CONTENT, reply)
    }

    /// Returns the workflow state of the document at `path` (e.g. `"work"`).
    pub async fn get_document_state(&self, path: &DocumentPath) -> Result<Value, RemoteError> {
        self.call(method::GET_DOCUMENT_STATE, vec![path.into()]).await
    }

    /// Creates a document of `portal_type` inside `folder` and returns its identifier.
    ///
    /// The wire order is `[type, metadata, folder, position]`: metadata
    /// precedes the folder path, unlike this method's own argument order.
    /// Existing servers depend on it. A negative `position` (see
    /// [`DEFAULT_POSITION`]) leaves placement to the server.
    pub async fn create_document(
        &self,
        portal_type: &PortalType,
        folder: &DocumentPath,
        metadata: DocumentMetadata,
        position: i32,
    ) -> Result<String, RemoteError> {
        let params = vec![portal_type.into(), metadata.into(), folder.into(), position.into()];
        let reply = self.call(method::CREATE_DOCUMENT, params).await?;
        expect_string(method::CREATE_DOCUMENT, reply)
    }

    /// Updates the document at `path` with the fields in `metadata`.
    pub async fn edit_document(
        &self,
        path: &DocumentPath,
        metadata: DocumentMetadata,
    ) -> Result<Value, RemoteError> {
        self.call(method::EDIT_DOCUMENT, vec![path.into(), metadata.into()])
            .await
    }

    /// Returns the document history as a map of workflow action to time string.
    pub async fn get_document_history(
        &self,
        path: &DocumentPath,
    ) -> Result<BTreeMap<String, Value>, RemoteError> {
        let reply = self.call(method::GET_DOCUMENT_HISTORY, vec![path.into()]).await?;
        reply
            .into_struct()
            .map_err(|other| unexpected(method::GET_DOCUMENT_HISTORY, "struct", &other))
    }

    /// Returns whether the document at `path` holds a WebDAV lock.
    pub async fn is_document_locked(&self, path: &DocumentPath) -> Result<bool, RemoteError> {
        let reply = self.call(method::IS_DOCUMENT_LOCKED, vec![path.into()]).await?;
        expect_bool(method::IS_DOCUMENT_LOCKED, reply)
    }

    // -----------------------------------------------------------------------
    // Workflow
    // -----------------------------------------------------------------------

    /// Submits the document at `document` for publication into `section`.
    pub async fn publish_document(
        &self,
        document: &DocumentPath,
        section: &DocumentPath,
    ) -> Result<Value, RemoteError> {
        self.call(method::PUBLISH_DOCUMENT, vec![document.into(), section.into()])
            .await
    }

    /// Withdraws the published document at `path` (a `sections/...` path).
    pub async fn unpublish_document(&self, path: &DocumentPath) -> Result<Value, RemoteError> {
        self.call(method::UNPUBLISH_DOCUMENT, vec![path.into()]).await
    }

    /// Moves the document `step` positions within its folder (negative moves up).
    pub async fn change_document_position(
        &self,
        path: &DocumentPath,
        step: i32,
    ) -> Result<Value, RemoteError> {
        self.call(method::CHANGE_DOCUMENT_POSITION, vec![path.into(), step.into()])
            .await
    }

    // -----------------------------------------------------------------------
    // Security
    // -----------------------------------------------------------------------

    /// Returns the global roles of `username`.
    pub async fn get_roles(&self, username: &Username) -> Result<Vec<Value>, RemoteError> {
        let reply = self.call(method::GET_ROLES, vec![username.into()]).await?;
        expect_array(method::GET_ROLES, reply)
    }

    /// Returns the roles `username` holds locally on the object at `path`.
    pub async fn get_local_roles(
        &self,
        username: &Username,
        path: &DocumentPath,
    ) -> Result<Vec<Value>, RemoteError> {
        let reply = self
            .call(method::GET_LOCAL_ROLES, vec![username.into(), path.into()])
            .await?;
        expect_array(method::GET_LOCAL_ROLES, reply)
    }

    /// Checks `permission` for the authenticated user on the object at `path`.
    pub async fn check_permission(
        &self,
        path: &DocumentPath,
        permission: &Permission,
    ) -> Result<bool, RemoteError> {
        let reply = self
            .call(method::CHECK_PERMISSION, vec![path.into(), permission.into()])
            .await?;
        expect_bool(method::CHECK_PERMISSION, reply)
    }
}

// ---------------------------------------------------------------------------
// Return-contract checks
// ---------------------------------------------------------------------------

fn unexpected(method: &str, expected: &'static str, actual: &Value) -> RemoteError {
    RemoteError::UnexpectedResult {
        method: method.to_owned(),
        expected,
        actual: actual.kind(),
    }
}

fn expect_array(method: &str, reply: Value) -> Result<Vec<Value>, RemoteError> {
    reply
        .into_array()
        .map_err(|other| unexpected(method, "array", &other))
}

fn expect_string(method: &str, reply: Value) -> Result<String, RemoteError> {
    reply
        .into_string()
        .map_err(|other| unexpected(method, "string", &other))
}

/// Zope answers some predicates with `0`/`1` integers rather than booleans.
fn expect_bool(method: &str, reply: Value) -> Result<bool, RemoteError> {
    match reply {
        Value::Boolean(b) => Ok(b),
        Value::Int(n) => Ok(n != 0),
        other => Err(unexpected(method, "boolean", &other)),
    }
}
