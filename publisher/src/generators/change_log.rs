use super::{
    PointContext,
    PointGenerator,
};
use crate::{
    build::Build,
    point::Point,
};
use eyre::Result;

/// Commits that went into the build.
pub struct ChangeLogPointGenerator<'a> {
    ctx: &'a PointContext,
    build: &'a dyn Build,
}

impl<'a> ChangeLogPointGenerator<'a> {
    pub fn new(ctx: &'a PointContext, build: &'a dyn Build) -> Self {
        Self { ctx, build }
    }
}

impl PointGenerator for ChangeLogPointGenerator<'_> {
    fn name(&self) -> &'static str {
        "Change log"
    }

    fn has_report(&mut self) -> bool {
        !self.build.change_log().is_empty()
    }

    fn generate(&mut self) -> Result<Vec<Point>> {
        let entries = self.build.change_log();

        let commit_messages = entries
            .iter()
            .map(|entry| entry.message.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect::<Vec<_>>()
            .join("; ");

        let mut culprits: Vec<&str> = Vec::new();
        for entry in entries {
            if !entry.author.is_empty() && !culprits.contains(&entry.author.as_str()) {
                culprits.push(&entry.author);
            }
        }

        let affected_paths = entries
            .iter()
            .flat_map(|entry| entry.affected_paths.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(", ");

        let point = self
            .ctx
            .base_point("changelog_data", self.build)
            .field("commit_messages", commit_messages)
            .field("culprits", culprits.join(", "))
            .field("affected_paths", affected_paths)
            .field("commit_count", entries.len())
            .build()?;
        Ok(vec![point])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        build::ChangeLogEntry,
        point::FieldValue,
        renderer::ProjectNameRenderer,
        testing::{
            FakeBuild,
            TIMESTAMP,
        },
    };
    use pretty_assertions::assert_eq;

    fn entry(message: &str, author: &str, paths: &[&str]) -> ChangeLogEntry {
        ChangeLogEntry {
            message: message.to_string(),
            author: author.to_string(),
            affected_paths: paths.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn summarizes_commits() {
        let ctx = PointContext::new(ProjectNameRenderer::default(), None, TIMESTAMP, false);
        let mut build = FakeBuild::new("job", 1);
        let mut generator = ChangeLogPointGenerator::new(&ctx, &build);
        assert!(!generator.has_report());

        build.change_log = vec![
            entry("Fix login\n\nDetails here", "alice", &["src/login.rs"]),
            entry("Bump deps", "bob", &["Cargo.toml", "Cargo.lock"]),
            entry("Typo", "alice", &[]),
        ];
        let points = ChangeLogPointGenerator::new(&ctx, &build).generate().unwrap();

        let point = &points[0];
        assert_eq!(point.measurement(), "changelog_data");
        assert_eq!(
            point.field("commit_messages"),
            Some(&FieldValue::String("Fix login Details here; Bump deps; Typo".into()))
        );
        assert_eq!(point.field("culprits"), Some(&FieldValue::String("alice, bob".into())));
        assert_eq!(
            point.field("affected_paths"),
            Some(&FieldValue::String("src/login.rs, Cargo.toml, Cargo.lock".into()))
        );
        assert_eq!(point.field("commit_count"), Some(&FieldValue::Integer(3)));
    }
}
