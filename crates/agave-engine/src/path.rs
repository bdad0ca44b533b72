//! Remote path resolution.

/// Resolve `candidate` against the remote working directory `cwd`.
///
/// Absolute candidates ignore `cwd`. `.` and empty segments are dropped and
/// `..` removes the previous segment; at the root it has no effect. The
/// result is `/`-joined with a leading `/`, or empty when nothing remains
/// (the root itself).
pub fn resolve(candidate: &str, cwd: &str) -> String {
  let joined;
  let full = if candidate.starts_with('/') {
    candidate
  } else {
    joined = format!("{cwd}/{candidate}");
    &joined
  };

  let mut segments: Vec<&str> = Vec::new();
  for segment in full.split('/') {
    match segment {
      "" | "." => {}
      ".." => {
        segments.pop();
      }
      other => segments.push(other),
    }
  }

  if segments.is_empty() {
    String::new()
  } else {
    format!("/{}", segments.join("/"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_relative_against_cwd() {
    assert_eq!(resolve("c/d", "/a/b"), "/a/b/c/d");
    assert_eq!(resolve("..", "/a/b"), "/a");
    assert_eq!(resolve(".", "/a"), "/a");
    assert_eq!(resolve("b/../c", "/a"), "/a/c");
    assert_eq!(resolve("./x//y/", "/home/alice"), "/home/alice/x/y");
  }

  #[test]
  fn test_absolute_ignores_cwd() {
    assert_eq!(resolve("/x/./y", "/a/b"), "/x/y");
    assert_eq!(resolve("/x/../y", "/a/b"), "/y");
  }

  #[test]
  fn test_parent_at_root_is_clamped() {
    assert_eq!(resolve("../../x", "/a"), "/x");
    assert_eq!(resolve("..", ""), "");
  }

  #[test]
  fn test_root_resolves_to_empty() {
    assert_eq!(resolve("/", "/a"), "");
    assert_eq!(resolve("", ""), "");
    assert_eq!(resolve(".", ""), "");
  }

  #[test]
  fn test_resolution_is_idempotent() {
    for (candidate, cwd) in [("a/../b/./c", "/w"), ("../q", "/w/v"), ("x/..//y", "")] {
      let once = resolve(candidate, cwd);
      assert_eq!(resolve(&once, "/elsewhere"), once);
    }
  }
}
