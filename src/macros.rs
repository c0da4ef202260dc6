// Logging wrappers. These expand to nothing unless the 'logging' feature is
// enabled, so call sites don't need their own cfg attributes.
macro_rules! log {
    ($($tt:tt)*) => {
        #[cfg(feature = "logging")]
        {
            $($tt)*
        }
    };
}

macro_rules! debug {
    ($($tt:tt)*) => { log!(log::debug!($($tt)*)) }
}

macro_rules! trace {
    ($($tt:tt)*) => { log!(log::trace!($($tt)*)) }
}

// The macros below implement the four search loops shared by every automaton
// representation. They are macros, and not functions, so that each transition
// table variant can instantiate them with its own transition routine. The
// variant dispatch then happens exactly once per search call, and the loops
// themselves process each input byte with a fixed number of operations.
//
// Each loop relies on the `max_match` state ordering: a single
// `is_possible_match_state` comparison per byte distinguishes the
// interesting states (dead or match) from everything else, and only in that
// case is a second comparison against the dead state needed.
//
// These macros expand to expressions that `return` early, so they must be
// used in tail position of a function with the matching return type.

macro_rules! is_match {
    ($dfa:expr, $bytes:expr, $next:ident) => {{
        let mut state = $dfa.start_state();
        if $dfa.is_possible_match_state(state) {
            return !$dfa.is_dead_state(state);
        }
        for &b in $bytes.iter() {
            state = unsafe { $dfa.$next(state, b) };
            if $dfa.is_possible_match_state(state) {
                return !$dfa.is_dead_state(state);
            }
        }
        false
    }};
}

macro_rules! shortest_match {
    ($dfa:expr, $bytes:expr, $next:ident) => {{
        let mut state = $dfa.start_state();
        if $dfa.is_possible_match_state(state) {
            return if $dfa.is_dead_state(state) { None } else { Some(0) };
        }
        for (i, &b) in $bytes.iter().enumerate() {
            state = unsafe { $dfa.$next(state, b) };
            if $dfa.is_possible_match_state(state) {
                return if $dfa.is_dead_state(state) {
                    None
                } else {
                    Some(i + 1)
                };
            }
        }
        None
    }};
}

macro_rules! find {
    ($dfa:expr, $bytes:expr, $next:ident) => {{
        let mut state = $dfa.start_state();
        let mut last_match = if $dfa.is_dead_state(state) {
            return None;
        } else if $dfa.is_match_state(state) {
            Some(0)
        } else {
            None
        };
        for (i, &b) in $bytes.iter().enumerate() {
            state = unsafe { $dfa.$next(state, b) };
            if $dfa.is_possible_match_state(state) {
                if $dfa.is_dead_state(state) {
                    return last_match;
                }
                last_match = Some(i + 1);
            }
        }
        last_match
    }};
}

macro_rules! rfind {
    ($dfa:expr, $bytes:expr, $next:ident) => {{
        let mut state = $dfa.start_state();
        let mut last_match = if $dfa.is_dead_state(state) {
            return None;
        } else if $dfa.is_match_state(state) {
            Some($bytes.len())
        } else {
            None
        };
        for (i, &b) in $bytes.iter().enumerate().rev() {
            state = unsafe { $dfa.$next(state, b) };
            if $dfa.is_possible_match_state(state) {
                if $dfa.is_dead_state(state) {
                    return last_match;
                }
                last_match = Some(i);
            }
        }
        last_match
    }};
}
