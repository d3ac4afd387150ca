//! Capability resolution at the request boundary.

/// The role a caller authenticated as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// A regular player.
    Player,
    /// A content administrator.
    Admin,
}

/// What a caller is allowed to do.
///
/// Resolved from [`Role`] once, at the boundary, and passed into the
/// operations that need it. Handlers check the capability they require
/// instead of consulting a shared user object mid-flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    author_content: bool,
}

impl Capabilities {
    /// Resolves the capabilities for a role.
    #[must_use]
    pub const fn for_role(role: Role) -> Self {
        match role {
            Role::Player => Self {
                author_content: false,
            },
            Role::Admin => Self {
                author_content: true,
            },
        }
    }

    /// Whether the caller may register puzzles, levels, and achievements.
    #[must_use]
    pub const fn can_author_content(self) -> bool {
        self.author_content
    }
}
