//! "Did you mean" hints for mistyped commands and options.

use strsim::levenshtein;

/// Largest edit distance still worth suggesting.
const MAX_DISTANCE: usize = 2;

/// Closest candidate within [`MAX_DISTANCE`] edits; earliest wins ties.
pub fn suggest_similar<'a, I>(input: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best_match: Option<(&str, usize)> = None;

    for candidate in candidates {
        if candidate == input {
            continue;
        }
        let distance = levenshtein(input, candidate);
        if distance > MAX_DISTANCE {
            continue;
        }
        match best_match {
            Some((_, best)) if distance >= best => {}
            _ => best_match = Some((candidate, distance)),
        }
    }

    best_match.map(|(candidate, _)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggest_close_match() {
        let options = ["--verbose", "--verbosity", "--config"];
        assert_eq!(suggest_similar("--verbos", options), Some("--verbose"));
        assert_eq!(suggest_similar("--confg", options), Some("--config"));
    }

    #[test]
    fn test_no_suggestion_when_far() {
        assert_eq!(suggest_similar("deploy", ["greet", "sum"]), None);
        assert_eq!(suggest_similar("greet", Vec::<&str>::new()), None);
    }

    #[test]
    fn test_ties_prefer_first_candidate() {
        assert_eq!(suggest_similar("cmd", ["cmd1", "cmd2"]), Some("cmd1"));
    }
}
