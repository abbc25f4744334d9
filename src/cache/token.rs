use crate::error::TokenUnavailableError;

/// What the last refresh attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenState {
    /// Nothing requested yet, or invalidated on shutdown.
    Absent,
    Issued {
        value: String,
        issued_at: u64,  // UNIX TIMESTAMP
        expires_in: u64, // seconds
    },
    Rejected {
        error_code: String,
        error_description: String,
        attempted_at: u64, // UNIX TIMESTAMP
    },
}

/// Immutable token snapshot. A refresh never edits a token in place; it
/// installs a new one with the next generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    generation: u64,
    state: TokenState,
}

impl AccessToken {
    pub fn absent(generation: u64) -> Self {
        Self {
            generation,
            state: TokenState::Absent,
        }
    }

    pub fn issued(generation: u64, value: String, issued_at: u64, expires_in: u64) -> Self {
        Self {
            generation,
            state: TokenState::Issued {
                value,
                issued_at,
                expires_in,
            },
        }
    }

    pub fn rejected(
        generation: u64,
        error_code: String,
        error_description: String,
        attempted_at: u64,
    ) -> Self {
        Self {
            generation,
            state: TokenState::Rejected {
                error_code,
                error_description,
                attempted_at,
            },
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> &TokenState {
        &self.state
    }

    /// `None` unless a token was issued.
    pub fn expires_at(&self) -> Option<u64> {
        match &self.state {
            TokenState::Issued {
                issued_at,
                expires_in,
                ..
            } => Some(issued_at.saturating_add(*expires_in)),
            _ => None,
        }
    }

    /// Absent and rejected tokens are always expired.
    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at().map_or(true, |expires_at| expires_at <= now)
    }

    /// True once a refresh attempt produced this token, successful or not.
    pub fn is_attempted(&self) -> bool {
        !matches!(self.state, TokenState::Absent)
    }

    /// Seconds elapsed since a rejected attempt, or `None` for other states.
    pub fn failed_for(&self, now: u64) -> Option<u64> {
        match &self.state {
            TokenState::Rejected { attempted_at, .. } => Some(now.saturating_sub(*attempted_at)),
            _ => None,
        }
    }

    /// The bearer value, or the reason there is none.
    pub fn bearer(&self) -> Result<String, TokenUnavailableError> {
        match &self.state {
            TokenState::Issued { value, .. } => Ok(value.to_owned()),
            TokenState::Rejected {
                error_code,
                error_description,
                ..
            } => Err(TokenUnavailableError::new(
                error_code.to_owned(),
                error_description.to_owned(),
            )),
            TokenState::Absent => Err(TokenUnavailableError::absent()),
        }
    }
}
