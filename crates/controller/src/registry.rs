//! A named set of remote controller endpoints with one active selection.
//!
//! Lets a single process address several portals: servers are registered
//! under a [`ServerName`], one is made active, and a client is built for the
//! active endpoint.

use std::collections::BTreeMap;

use crate::{Endpoint, RemoteError, ServerName};

#[derive(Debug, Clone, Default)]
pub struct ServerRegistry {
    servers: BTreeMap<ServerName, Endpoint>,
    active: Option<ServerName>,
}

impl ServerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `endpoint` under `name`, replacing any previous entry.
    pub fn add_server(&mut self, name: ServerName, endpoint: Endpoint) {
        tracing::debug!(server = %name, endpoint = %endpoint, "Server registered");
        self.servers.insert(name, endpoint);
    }

    /// Removes `name`; clears the active selection if it pointed there.
    ///
    /// Returns the removed endpoint, or `None` if the name was not registered.
    pub fn remove_server(&mut self, name: &ServerName) -> Option<Endpoint> {
        if self.active.as_ref() == Some(name) {
            self.active = None;
        }
        self.servers.remove(name)
    }

    /// Returns every registered server, sorted by name.
    pub fn list_servers(&self) -> Vec<(&ServerName, &Endpoint)> {
        self.servers.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn get(&self, name: &ServerName) -> Option<&Endpoint> {
        self.servers.get(name)
    }

    /// Makes `name` the target of subsequent calls.
    ///
    /// # Errors
    ///
    /// [`RemoteError::UnknownServer`] if `name` is not registered; the
    /// previous selection is kept.
    pub fn set_active(&mut self, name: &ServerName) -> Result<(), RemoteError> {
        if !self.servers.contains_key(name) {
            return Err(RemoteError::UnknownServer(name.clone()));
        }
        self.active = Some(name.clone());
        Ok(())
    }

    /// The currently selected server, if any.
    pub fn active(&self) -> Option<&ServerName> {
        self.active.as_ref()
    }

    /// The current selection, falling back to (and selecting) the first
    /// server by name when nothing is active.
    pub fn active_or_first(&mut self) -> Option<&ServerName> {
        if self.active.is_none() {
            self.active = self.servers.keys().next().cloned();
        }
        self.active.as_ref()
    }

    /// Resolves the endpoint a client should be built for.
    ///
    /// # Errors
    ///
    /// [`RemoteError::NoServers`] if the registry is empty.
    pub fn active_endpoint(&mut self) -> Result<(&ServerName, &Endpoint), RemoteError> {
        self.active_or_first();
        let name = self.active.as_ref().ok_or(RemoteError::NoServers)?;
        let endpoint = self
            .servers
            .get(name)
            .ok_or_else(|| RemoteError::UnknownServer(name.clone()))?;
        Ok((name, endpoint))
    }
}
