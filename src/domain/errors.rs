// Domain-level errors for registry operations.
//
// None of these reach a client; the event router treats every variant as a benign race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    // Referenced player is not (or no longer) registered.
    NotFound,
    // Operation precondition not met, e.g. respawn while alive.
    IllegalState,
    // Connection id is already registered.
    AlreadyExists,
}
