//! Case tests used by switch routers.
//!
//! Each test checks an input against its arguments and returns the part of
//! the input that matched, which becomes the result value.

/// Signature of a case test.
pub type CaseTest = fn(input: &str, args: &[String]) -> Option<String>;

/// Look up a test by name.
pub fn lookup(name: &str) -> Option<CaseTest> {
  let test: CaseTest = match name {
    "has_text" => has_text,
    "has_only_text" => has_only_text,
    "has_any_word" => has_any_word,
    "has_all_words" => has_all_words,
    "has_beginning" => has_beginning,
    "has_phrase" => has_phrase,
    "has_number" => has_number,
    "has_number_between" => has_number_between,
    "has_number_eq" => has_number_eq,
    "has_number_lt" => has_number_lt,
    "has_number_gt" => has_number_gt,
    _ => return None,
  };
  Some(test)
}

fn words(s: &str) -> Vec<String> {
  s.split(|c: char| !c.is_alphanumeric())
    .filter(|w| !w.is_empty())
    .map(str::to_lowercase)
    .collect()
}

fn has_text(input: &str, _args: &[String]) -> Option<String> {
  let trimmed = input.trim();
  (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn has_only_text(input: &str, args: &[String]) -> Option<String> {
  let expected = args.first()?;
  (input.trim() == expected.trim()).then(|| input.trim().to_string())
}

fn has_any_word(input: &str, args: &[String]) -> Option<String> {
  let wanted = words(&args.join(" "));
  let matched: Vec<String> = words(input).into_iter().filter(|w| wanted.contains(w)).collect();
  (!matched.is_empty()).then(|| matched.join(" "))
}

fn has_all_words(input: &str, args: &[String]) -> Option<String> {
  let wanted = words(&args.join(" "));
  let present = words(input);
  (!wanted.is_empty() && wanted.iter().all(|w| present.contains(w))).then(|| wanted.join(" "))
}

fn has_beginning(input: &str, args: &[String]) -> Option<String> {
  let prefix = args.first()?.trim();
  let input = input.trim();
  let head = input.get(..prefix.len())?;
  (!prefix.is_empty() && head.eq_ignore_ascii_case(prefix)).then(|| head.to_string())
}

fn has_phrase(input: &str, args: &[String]) -> Option<String> {
  let phrase = words(args.first()?);
  if phrase.is_empty() {
    return Some(String::new());
  }
  let present = words(input);
  present
    .windows(phrase.len())
    .any(|w| w == phrase.as_slice())
    .then(|| phrase.join(" "))
}

fn first_number(input: &str) -> Option<f64> {
  input
    .split(|c: char| c.is_whitespace() || c == ',')
    .find_map(|w| w.trim_matches(|c: char| !c.is_ascii_digit() && c != '.' && c != '-').parse::<f64>().ok())
    .filter(|n| n.is_finite())
}

fn format_number(n: f64) -> String {
  if n.fract() == 0.0 && n.abs() < 1e15 {
    format!("{}", n as i64)
  } else {
    n.to_string()
  }
}

fn number_arg(args: &[String], index: usize) -> Option<f64> {
  args.get(index)?.trim().parse().ok()
}

fn has_number(input: &str, _args: &[String]) -> Option<String> {
  first_number(input).map(format_number)
}

fn has_number_between(input: &str, args: &[String]) -> Option<String> {
  let (min, max) = (number_arg(args, 0)?, number_arg(args, 1)?);
  first_number(input)
    .filter(|n| *n >= min && *n <= max)
    .map(format_number)
}

fn has_number_eq(input: &str, args: &[String]) -> Option<String> {
  let expected = number_arg(args, 0)?;
  first_number(input).filter(|n| *n == expected).map(format_number)
}

fn has_number_lt(input: &str, args: &[String]) -> Option<String> {
  let limit = number_arg(args, 0)?;
  first_number(input).filter(|n| *n < limit).map(format_number)
}

fn has_number_gt(input: &str, args: &[String]) -> Option<String> {
  let limit = number_arg(args, 0)?;
  first_number(input).filter(|n| *n > limit).map(format_number)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn run(test: &str, input: &str, args: &[&str]) -> Option<String> {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    lookup(test).unwrap()(input, &args)
  }

  #[test]
  fn test_text_tests() {
    assert_eq!(run("has_text", "  hi ", &[]), Some("hi".to_string()));
    assert_eq!(run("has_text", "   ", &[]), None);
    assert_eq!(run("has_only_text", "yes", &["yes"]), Some("yes".to_string()));
    assert_eq!(run("has_only_text", "yes please", &["yes"]), None);
    assert_eq!(run("has_any_word", "I like Red and blue", &["red green"]), Some("red".to_string()));
    assert_eq!(run("has_any_word", "purple", &["red green"]), None);
    assert_eq!(run("has_all_words", "Red, then green", &["green red"]), Some("green red".to_string()));
    assert_eq!(run("has_all_words", "just red", &["green red"]), None);
    assert_eq!(run("has_beginning", "Yes I do", &["yes"]), Some("Yes".to_string()));
    assert_eq!(run("has_phrase", "the quick brown fox", &["quick brown"]), Some("quick brown".to_string()));
    assert_eq!(run("has_phrase", "the brown quick fox", &["quick brown"]), None);
  }

  #[test]
  fn test_number_tests() {
    assert_eq!(run("has_number", "I am 24 years", &[]), Some("24".to_string()));
    assert_eq!(run("has_number", "twenty", &[]), None);
    assert_eq!(run("has_number_between", "it's 7.5", &["5", "10"]), Some("7.5".to_string()));
    assert_eq!(run("has_number_between", "11", &["5", "10"]), None);
    assert_eq!(run("has_number_eq", "5", &["5"]), Some("5".to_string()));
    assert_eq!(run("has_number_lt", "4", &["5"]), Some("4".to_string()));
    assert_eq!(run("has_number_gt", "4", &["5"]), None);
  }

  #[test]
  fn test_unknown_test() {
    assert!(lookup("has_vibes").is_none());
  }
}
