use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Which side of the match a peer plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Accepts the inbound connection and owns progression decisions
    Host,
    /// Dials the host and mirrors its decisions
    Guest,
}

impl Role {
    pub fn opponent(self) -> Role {
        match self {
            Role::Host => Role::Guest,
            Role::Guest => Role::Host,
        }
    }

    pub fn is_host(self) -> bool {
        matches!(self, Role::Host)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host => write!(f, "host"),
            Role::Guest => write!(f, "guest"),
        }
    }
}

/// Running score per player
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub host: u32,
    pub guest: u32,
}

impl Scores {
    pub fn new(host: u32, guest: u32) -> Self {
        Self { host, guest }
    }
}

impl Index<Role> for Scores {
    type Output = u32;

    fn index(&self, role: Role) -> &u32 {
        match role {
            Role::Host => &self.host,
            Role::Guest => &self.guest,
        }
    }
}

impl IndexMut<Role> for Scores {
    fn index_mut(&mut self, role: Role) -> &mut u32 {
        match role {
            Role::Host => &mut self.host,
            Role::Guest => &mut self.guest,
        }
    }
}

/// Per-player "has submitted for the current question" flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerFlags {
    pub host: bool,
    pub guest: bool,
}

impl AnswerFlags {
    pub fn both(&self) -> bool {
        self.host && self.guest
    }

    pub fn has_answered(&self, role: Role) -> bool {
        match role {
            Role::Host => self.host,
            Role::Guest => self.guest,
        }
    }

    pub fn mark(&mut self, role: Role) {
        match role {
            Role::Host => self.host = true,
            Role::Guest => self.guest = true,
        }
    }
}
