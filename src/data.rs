//! Built-in catalogue imported by the `seed` binary when no `SEED_FILE` is set

use crate::model::{ApplicationMode, CategorySeed, RuleSeed};
use crate::seed::SeedData;

struct CategoryDef {
    name: &'static str,
    description: &'static str,
    icon: &'static str,
}

struct RuleDef {
    title: &'static str,
    description: &'static str,
    categories: &'static [&'static str],
    tags: &'static [&'static str],
    mode: Option<ApplicationMode>,
    globs: Option<&'static str>,
    content: &'static str,
}

const CATEGORIES: &[CategoryDef] = &[
    CategoryDef {
        name: "Frontend",
        description: "UI frameworks, component design and browser tooling",
        icon: "layout",
    },
    CategoryDef {
        name: "React",
        description: "Hooks, components and state management in React",
        icon: "atom",
    },
    CategoryDef {
        name: "Next.js",
        description: "App Router, server components and deployment for Next.js",
        icon: "triangle",
    },
    CategoryDef {
        name: "Backend",
        description: "Services, APIs and data access",
        icon: "server",
    },
    CategoryDef {
        name: "Rust",
        description: "Ownership, error handling and crate design in Rust",
        icon: "cog",
    },
    CategoryDef {
        name: "Python",
        description: "Typed, tested and packaged Python",
        icon: "snake",
    },
    CategoryDef {
        name: "Testing",
        description: "Unit, integration and end-to-end testing practices",
        icon: "check",
    },
    CategoryDef {
        name: "DevOps",
        description: "CI pipelines, containers and infrastructure as code",
        icon: "cloud",
    },
];

const RULES: &[RuleDef] = &[
    RuleDef {
        title: "React Hooks Expert",
        description: "Rules for writing correct, composable React hooks",
        categories: &["React", "Frontend"],
        tags: &["react", "hooks", "typescript"],
        mode: Some(ApplicationMode::Files),
        globs: Some("**/*.{tsx,jsx}"),
        content: "\
You are an expert in React hooks.

- Call hooks only at the top level of components and custom hooks.
- Keep effect dependency arrays complete; prefer restructuring over suppressing the lint.
- Derive values during render instead of mirroring props into state.
- Extract reusable stateful logic into custom hooks named `useSomething`.
- Clean up subscriptions, timers and listeners in the effect's return function.
- Guard async effects against updates after unmount.
- Reach for `useMemo`/`useCallback` only when profiling shows a need.
",
    },
    RuleDef {
        title: "Next.js App Router",
        description: "Conventions for the Next.js App Router and server components",
        categories: &["Next.js", "React", "Frontend"],
        tags: &["nextjs", "react", "server-components"],
        mode: Some(ApplicationMode::Files),
        globs: Some("app/**/*.{ts,tsx}"),
        content: "\
You are an expert in Next.js with the App Router.

- Default to server components; add 'use client' only where interactivity is needed.
- Fetch data in server components and pass plain props down.
- Co-locate loading.tsx and error.tsx with the route segments they guard.
- Use route handlers for mutations called from outside the app.
- Keep secrets on the server; never import server-only modules into client components.
",
    },
    RuleDef {
        title: "Rust Development",
        description: "Idiomatic, safe and well-tested Rust",
        categories: &["Rust", "Backend"],
        tags: &["rust", "cargo"],
        mode: Some(ApplicationMode::Files),
        globs: Some("**/*.rs"),
        content: "\
You are an expert Rust developer.

- Return `Result` and propagate with `?`; avoid `unwrap` outside tests.
- Model domain errors with an enum; use `thiserror` in libraries and `anyhow` in binaries.
- Prefer borrowing over cloning; clone deliberately at ownership boundaries.
- Keep `unsafe` blocks minimal and document the invariant they rely on.
- Run `cargo fmt` and `cargo clippy -- -D warnings` before committing.
- Write unit tests in a `#[cfg(test)]` module next to the code and integration tests under `tests/`.
",
    },
    RuleDef {
        title: "Python Type Hints",
        description: "Static typing discipline for Python codebases",
        categories: &["Python", "Backend"],
        tags: &["python", "mypy"],
        mode: Some(ApplicationMode::Files),
        globs: Some("**/*.py"),
        content: "\
You are an expert in typed Python.

- Annotate every public function signature.
- Prefer `collections.abc` protocols over concrete container types in parameters.
- Use dataclasses or pydantic models instead of loose dicts.
- Run mypy in strict mode in CI.
",
    },
    RuleDef {
        title: "Test-Driven Development",
        description: "Red, green, refactor in small steps",
        categories: &["Testing"],
        tags: &["tdd", "testing"],
        mode: Some(ApplicationMode::Intelligent),
        globs: None,
        content: "\
Follow test-driven development.

- Write a failing test that names the behaviour before writing code.
- Make it pass with the simplest change.
- Refactor with the tests green.
- One assertion concept per test; name tests after the behaviour, not the method.
",
    },
    RuleDef {
        title: "Docker Best Practices",
        description: "Small, reproducible and secure container images",
        categories: &["DevOps"],
        tags: &["docker", "containers"],
        mode: Some(ApplicationMode::Files),
        globs: Some("**/Dockerfile*"),
        content: "\
You are an expert in container images.

- Use multi-stage builds and a minimal runtime base image.
- Pin base image versions by digest.
- Order layers from least to most frequently changing.
- Run as a non-root user.
- Keep secrets out of build args and image layers.
",
    },
    RuleDef {
        title: "Clean Code Principles",
        description: "General guidance that applies to every change",
        categories: &["Backend", "Frontend"],
        tags: &["clean-code"],
        mode: Some(ApplicationMode::Always),
        globs: None,
        content: "\
- Name things after what they do.
- Keep functions short and at a single level of abstraction.
- Delete dead code instead of commenting it out.
- Leave the code a little cleaner than you found it.
",
    },
];

/// The built-in categories and rules
pub fn builtin() -> SeedData {
    SeedData {
        categories: CATEGORIES
            .iter()
            .map(|def| CategorySeed {
                name: def.name.to_string(),
                description: def.description.to_string(),
                icon: Some(def.icon.to_string()),
            })
            .collect(),
        rules: RULES
            .iter()
            .map(|def| RuleSeed {
                title: def.title.to_string(),
                description: def.description.to_string(),
                content: def.content.to_string(),
                categories: def.categories.iter().map(|c| c.to_string()).collect(),
                tags: def.tags.iter().map(|t| t.to_string()).collect(),
                author: None,
                application_mode: def.mode,
                globs: def.globs.map(str::to_string),
                is_published: None,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::slugify;
    use std::collections::HashSet;

    #[test]
    fn builtin_slugs_are_unique_and_non_empty() {
        let data = builtin();

        let category_slugs: HashSet<_> = data.categories.iter().map(|c| slugify(&c.name)).collect();
        assert_eq!(category_slugs.len(), data.categories.len());
        assert!(!category_slugs.contains(""));

        let rule_slugs: HashSet<_> = data.rules.iter().map(|r| slugify(&r.title)).collect();
        assert_eq!(rule_slugs.len(), data.rules.len());
        assert!(!rule_slugs.contains(""));
    }

    #[test]
    fn builtin_rules_reference_known_categories() {
        let data = builtin();
        let known: HashSet<_> = data.categories.iter().map(|c| slugify(&c.name)).collect();

        for rule in &data.rules {
            for name in &rule.categories {
                assert!(known.contains(&slugify(name)), "{} -> {}", rule.title, name);
            }
        }
    }
}
