//! Global argument rewriting.
//!
//! Global options may be typed anywhere on the command line: before the
//! subcommand, after it, or between its own options. Before the group parses
//! anything, a single left-to-right scan pulls every global option (and the
//! value tokens it consumes) to the front, keeping the relative order inside
//! both partitions:
//!
//! ```text
//! cmd --flag -z val arg   =>   -z val | cmd --flag arg
//! ```
//!
//! A value token is only consumed when it does not start with `-` and is not
//! a registered command name or alias. Otherwise the option is left without
//! that value and the downstream parser reports the missing argument. This
//! means a value spelled like a command name cannot be passed to a global
//! option; that limitation is accepted.
//!
//! Because option spellings always start with `-`, a value token can never be
//! mistaken for an option on a second pass, which makes the rewrite
//! idempotent.

use std::collections::{BTreeSet, HashMap};

use crate::param::OptionSpec;

/// The two partitions produced by the rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewrittenArgs {
    /// Global option tokens and their consumed values, in input order.
    pub global: Vec<String>,
    /// Every other token, in input order.
    pub other: Vec<String>,
}

impl RewrittenArgs {
    /// `global ++ other`.
    pub fn into_tokens(self) -> Vec<String> {
        let mut tokens = self.global;
        tokens.extend(self.other);
        tokens
    }
}

/// Split `args` into global option tokens and everything else.
pub fn partition_global_arguments<S: AsRef<str>>(
    args: &[S],
    global_options: &[OptionSpec],
    command_names: &BTreeSet<String>,
) -> RewrittenArgs {
    let by_spelling: HashMap<&str, &OptionSpec> = global_options
        .iter()
        .flat_map(|option| option.spellings().iter().map(move |s| (s.as_str(), option)))
        .collect();

    let mut out = RewrittenArgs::default();
    let mut i = 0;
    while i < args.len() {
        let token = args[i].as_ref();
        i += 1;

        let Some(option) = by_spelling.get(token) else {
            out.other.push(token.to_string());
            continue;
        };
        out.global.push(token.to_string());
        if option.is_flag() {
            continue;
        }

        // Greedy, guarded: stop at the first token that cannot be a value.
        let mut taken = 0;
        while taken < option.arity_count() {
            match args.get(i).map(AsRef::as_ref) {
                Some(value) if can_be_value(value, command_names) => {
                    out.global.push(value.to_string());
                    i += 1;
                    taken += 1;
                }
                _ => break,
            }
        }
    }
    out
}

/// Reorder `args` so global option tokens come first.
pub fn rewrite_global_arguments<S: AsRef<str>>(
    args: &[S],
    global_options: &[OptionSpec],
    command_names: &BTreeSet<String>,
) -> Vec<String> {
    partition_global_arguments(args, global_options, command_names).into_tokens()
}

fn can_be_value(token: &str, command_names: &BTreeSet<String>) -> bool {
    !token.starts_with('-') && !command_names.contains(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn globals() -> Vec<OptionSpec> {
        vec![
            OptionSpec::flag("opt", ["--opt", "-o"]),
            OptionSpec::value("baz", ["--baz", "-z"]),
        ]
    }

    fn rewrite(args: &[&str]) -> Vec<String> {
        rewrite_global_arguments(args, &globals(), &names(&["cmd", "alias"]))
    }

    #[test]
    fn test_flag_moves_to_front() {
        assert_eq!(rewrite(&["--opt", "cmd"]), vec!["--opt", "cmd"]);
        assert_eq!(rewrite(&["cmd", "--opt"]), vec!["--opt", "cmd"]);
        assert_eq!(rewrite(&["cmd", "-o", "arg"]), vec!["-o", "cmd", "arg"]);
    }

    #[test]
    fn test_value_travels_with_option() {
        assert_eq!(rewrite(&["--baz", "x", "cmd"]), vec!["--baz", "x", "cmd"]);
        assert_eq!(
            rewrite(&["cmd", "--flag", "-z", "x", "arg"]),
            vec!["-z", "x", "cmd", "--flag", "arg"]
        );
    }

    #[test]
    fn test_command_name_is_never_consumed_as_value() {
        let parts = partition_global_arguments(
            &["--baz", "cmd"],
            &globals(),
            &names(&["cmd", "alias"]),
        );
        assert_eq!(parts.global, vec!["--baz"]);
        assert_eq!(parts.other, vec!["cmd"]);

        // Aliases count as command names too.
        assert_eq!(rewrite(&["-z", "alias"]), vec!["-z", "alias"]);
    }

    #[test]
    fn test_dash_value_is_never_consumed() {
        assert_eq!(
            rewrite(&["cmd", "--baz", "-5"]),
            vec!["--baz", "cmd", "-5"]
        );
        assert_eq!(rewrite(&["cmd", "--baz"]), vec!["--baz", "cmd"]);
    }

    #[test]
    fn test_multi_arity_stops_at_first_rejected_token() {
        let globals = vec![OptionSpec::value("pair", ["--pair"]).arity(2)];
        let cmds = names(&["cmd"]);

        let parts = partition_global_arguments(&["cmd", "--pair", "a", "b", "c"], &globals, &cmds);
        assert_eq!(parts.global, vec!["--pair", "a", "b"]);
        assert_eq!(parts.other, vec!["cmd", "c"]);

        let parts = partition_global_arguments(&["--pair", "a", "cmd", "b"], &globals, &cmds);
        assert_eq!(parts.global, vec!["--pair", "a"]);
        assert_eq!(parts.other, vec!["cmd", "b"]);
    }

    #[test]
    fn test_attached_values_are_not_recognised() {
        assert_eq!(rewrite(&["cmd", "--baz=x"]), vec!["cmd", "--baz=x"]);
    }

    #[test]
    fn test_no_globals_is_identity() {
        let args = ["cmd", "--opt", "x"];
        assert_eq!(
            rewrite_global_arguments(&args, &[], &names(&["cmd"])),
            vec!["cmd", "--opt", "x"]
        );
    }

    /// Every token sequence up to `max_len` over `alphabet`.
    fn sequences(alphabet: &[&'static str], max_len: usize) -> Vec<Vec<&'static str>> {
        let mut all = vec![Vec::new()];
        let mut frontier = vec![Vec::new()];
        for _ in 0..max_len {
            let mut next = Vec::new();
            for seq in &frontier {
                for token in alphabet {
                    let mut longer: Vec<&'static str> = seq.clone();
                    longer.push(token);
                    next.push(longer);
                }
            }
            all.extend(next.iter().cloned());
            frontier = next;
        }
        all
    }

    fn is_subsequence(part: &[String], whole: &[&str]) -> bool {
        let mut it = whole.iter();
        part.iter().all(|p| it.any(|w| *w == p.as_str()))
    }

    #[test]
    fn test_rewrite_properties_exhaustive() {
        let globals = vec![
            OptionSpec::flag("opt", ["--opt", "-o"]),
            OptionSpec::value("baz", ["--baz", "-z"]),
            OptionSpec::value("pair", ["--pair"]).arity(2),
        ];
        let cmds = names(&["cmd", "al"]);
        let alphabet = ["--opt", "-z", "--pair", "x", "cmd", "al", "-q", "--local"];

        for input in sequences(&alphabet, 4) {
            let parts = partition_global_arguments(&input, &globals, &cmds);

            // Order preservation inside each partition.
            assert!(is_subsequence(&parts.global, &input), "{input:?}");
            assert!(is_subsequence(&parts.other, &input), "{input:?}");
            // Nothing lost, nothing added.
            assert_eq!(parts.global.len() + parts.other.len(), input.len());

            let once = parts.into_tokens();
            let twice = rewrite_global_arguments(&once, &globals, &cmds);
            assert_eq!(once, twice, "not idempotent for {input:?}");

            // Determinism.
            assert_eq!(once, rewrite_global_arguments(&input, &globals, &cmds));
        }
    }
}
