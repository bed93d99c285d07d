//! Endpoint table for the rating API
//!
//! Every read-only operation the client knows about is a variant of
//! [`Endpoint`]. A variant carries its operation name (used in cache keys),
//! its path template and the number of arguments the template expects.

pub mod seasons;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RatingError, Result};

pub use seasons::{season_id, SEASONS};

/// Path segment used by the API for "the most recent one"
pub const LAST: &str = "last";

/// A single argument to an endpoint: the API accepts numeric ids and a few
/// literal segments such as `last`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiId {
    Int(i64),
    Str(String),
}

impl fmt::Display for ApiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiId::Int(id) => write!(f, "{}", id),
            ApiId::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ApiId {
    fn from(id: i64) -> Self {
        ApiId::Int(id)
    }
}

impl From<i32> for ApiId {
    fn from(id: i32) -> Self {
        ApiId::Int(id.into())
    }
}

impl From<u32> for ApiId {
    fn from(id: u32) -> Self {
        ApiId::Int(id.into())
    }
}

impl From<&str> for ApiId {
    fn from(s: &str) -> Self {
        ApiId::Str(s.to_string())
    }
}

impl From<String> for ApiId {
    fn from(s: String) -> Self {
        ApiId::Str(s)
    }
}

impl ApiId {
    /// Parses a command-line argument: canonical integers become `Int`,
    /// anything else (including `05773` or `+5773`) is kept verbatim as a
    /// string segment
    pub fn parse(s: &str) -> Self {
        match s.parse::<i64>() {
            Ok(id) if id.to_string() == s => ApiId::Int(id),
            _ => ApiId::Str(s.to_string()),
        }
    }

    /// The argument as a cache key segment; `%` and `:` in string ids are
    /// escaped so distinct argument lists never share a key
    fn key_segment(&self) -> String {
        match self {
            ApiId::Int(id) => id.to_string(),
            ApiId::Str(s) => s.replace('%', "%25").replace(':', "%3A"),
        }
    }
}

/// Read-only operations of the rating API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Player,
    PlayerRatings,
    PlayerRating,
    PlayerTeams,
    PlayerAllTournaments,
    PlayerTournaments,
    Team,
    TeamRatings,
    TeamRating,
    TeamRosters,
    TeamRoster,
    TeamAllTournaments,
    TeamTournaments,
    Tournament,
    TournamentResults,
    TournamentResultsTown,
    TournamentResultsRegion,
    TournamentResultsCountry,
    TournamentRosters,
    TournamentRoster,
    TournamentAnswers,
    TournamentAppeals,
}

impl Endpoint {
    /// Every endpoint, in documentation order
    pub const ALL: [Endpoint; 22] = [
        Endpoint::Player,
        Endpoint::PlayerRatings,
        Endpoint::PlayerRating,
        Endpoint::PlayerTeams,
        Endpoint::PlayerAllTournaments,
        Endpoint::PlayerTournaments,
        Endpoint::Team,
        Endpoint::TeamRatings,
        Endpoint::TeamRating,
        Endpoint::TeamRosters,
        Endpoint::TeamRoster,
        Endpoint::TeamAllTournaments,
        Endpoint::TeamTournaments,
        Endpoint::Tournament,
        Endpoint::TournamentResults,
        Endpoint::TournamentResultsTown,
        Endpoint::TournamentResultsRegion,
        Endpoint::TournamentResultsCountry,
        Endpoint::TournamentRosters,
        Endpoint::TournamentRoster,
        Endpoint::TournamentAnswers,
        Endpoint::TournamentAppeals,
    ];

    /// Operation name, used as the first segment of cache keys
    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Player => "player",
            Endpoint::PlayerRatings => "player_ratings",
            Endpoint::PlayerRating => "player_rating",
            Endpoint::PlayerTeams => "player_teams",
            Endpoint::PlayerAllTournaments => "player_all_tournaments",
            Endpoint::PlayerTournaments => "player_tournaments",
            Endpoint::Team => "team",
            Endpoint::TeamRatings => "team_ratings",
            Endpoint::TeamRating => "team_rating",
            Endpoint::TeamRosters => "team_rosters",
            Endpoint::TeamRoster => "team_roster",
            Endpoint::TeamAllTournaments => "team_all_tournaments",
            Endpoint::TeamTournaments => "team_tournaments",
            Endpoint::Tournament => "tournament",
            Endpoint::TournamentResults => "tournament_results",
            Endpoint::TournamentResultsTown => "tournament_results_town",
            Endpoint::TournamentResultsRegion => "tournament_results_region",
            Endpoint::TournamentResultsCountry => "tournament_results_country",
            Endpoint::TournamentRosters => "tournament_rosters",
            Endpoint::TournamentRoster => "tournament_roster",
            Endpoint::TournamentAnswers => "tournament_answers",
            Endpoint::TournamentAppeals => "tournament_appeals",
        }
    }

    /// Path template relative to the API root; `{n}` is the n-th argument
    pub fn template(self) -> &'static str {
        match self {
            Endpoint::Player => "players/{0}",
            Endpoint::PlayerRatings => "players/{0}/rating",
            Endpoint::PlayerRating => "players/{0}/rating/{1}",
            Endpoint::PlayerTeams => "players/{0}/teams",
            Endpoint::PlayerAllTournaments => "players/{0}/tournaments",
            Endpoint::PlayerTournaments => "players/{0}/tournaments/{1}",
            Endpoint::Team => "teams/{0}",
            Endpoint::TeamRatings => "teams/{0}/rating",
            Endpoint::TeamRating => "teams/{0}/rating/{1}",
            Endpoint::TeamRosters => "teams/{0}/recaps",
            Endpoint::TeamRoster => "teams/{0}/recaps/{1}",
            Endpoint::TeamAllTournaments => "teams/{0}/tournaments",
            Endpoint::TeamTournaments => "teams/{0}/tournaments/{1}",
            Endpoint::Tournament => "tournaments/{0}",
            Endpoint::TournamentResults => "tournaments/{0}/list",
            Endpoint::TournamentResultsTown => "tournaments/{0}/list/town/{1}",
            Endpoint::TournamentResultsRegion => "tournaments/{0}/list/region/{1}",
            Endpoint::TournamentResultsCountry => "tournaments/{0}/list/country/{1}",
            Endpoint::TournamentRosters => "tournaments/{0}/recaps",
            Endpoint::TournamentRoster => "tournaments/{0}/recaps/{1}",
            Endpoint::TournamentAnswers => "tournaments/{0}/controversials",
            Endpoint::TournamentAppeals => "tournaments/{0}/appeals",
        }
    }

    /// Number of arguments the path template takes
    pub fn arity(self) -> usize {
        self.template().matches('{').count()
    }

    /// Whether the API wraps the single requested object in a list
    pub fn is_single_object(self) -> bool {
        matches!(
            self,
            Endpoint::Player | Endpoint::Team | Endpoint::Tournament
        )
    }

    /// Looks an endpoint up by its operation name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.name() == name)
    }

    /// Renders the request path for the given arguments
    pub fn path(self, args: &[ApiId]) -> Result<String> {
        self.check_arity(args)?;

        // Single pass, so placeholders inside argument text stay untouched
        let mut path = String::with_capacity(self.template().len());
        let mut rest = self.template();
        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            let end = start + len;
            path.push_str(&rest[..start]);
            match rest[start + 1..end].parse::<usize>().ok().and_then(|i| args.get(i)) {
                Some(arg) => path.push_str(&arg.to_string()),
                None => path.push_str(&rest[start..=end]),
            }
            rest = &rest[end + 1..];
        }
        path.push_str(rest);
        Ok(path)
    }

    /// Builds the cache key: the operation name followed by each argument,
    /// joined with `:`
    pub fn cache_key(self, args: &[ApiId]) -> Result<String> {
        self.check_arity(args)?;
        let mut key = self.name().to_string();
        for arg in args {
            key.push(':');
            key.push_str(&arg.key_segment());
        }
        Ok(key)
    }

    fn check_arity(self, args: &[ApiId]) -> Result<()> {
        if args.len() != self.arity() {
            return Err(RatingError::Arity {
                endpoint: self.name(),
                expected: self.arity(),
                got: args.len(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
