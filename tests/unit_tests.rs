//! Unit tests for updatebot modules

mod common;

mod assignees_test {
    use crate::common::{MockScmFactory, MockScmService, make_commit, make_pr};
    use std::sync::Arc;
    use updatebot::config::Rule;
    use updatebot::engine::{
        AssigneeReason, AssigneeSet, PipelineContext, assign, assignees_for,
        find_parent_commit_author,
    };
    use updatebot::error::Error;

    fn pipeline() -> PipelineContext {
        PipelineContext {
            commit_sha: "target".to_string(),
            base_ref: "main".to_string(),
            repo_url: "https://github.com/acme/source".to_string(),
        }
    }

    #[tokio::test]
    async fn test_parent_author_by_list_position() {
        let scm = MockScmService::new();
        scm.set_commits(vec![
            make_commit("s0", "alice", &[]),
            make_commit("target", "bob", &[]),
            make_commit("s2", "carol", &[]),
        ]);
        let author = find_parent_commit_author(&scm, "target", "main").await.unwrap();
        assert_eq!(author, "carol");
    }

    #[tokio::test]
    async fn test_single_commit_has_no_possible_parent() {
        let scm = MockScmService::new();
        scm.set_commits(vec![make_commit("target", "bob", &[])]);
        let err = find_parent_commit_author(&scm, "target", "main").await.unwrap_err();
        assert!(
            err.to_string()
                .contains("no possible parent commit found for commit target")
        );
    }

    #[tokio::test]
    async fn test_absent_sha_has_no_parent() {
        let scm = MockScmService::new();
        scm.set_commits(vec![make_commit("a", "x", &[]), make_commit("b", "y", &[])]);
        let err = find_parent_commit_author(&scm, "target", "main").await.unwrap_err();
        assert!(err.to_string().contains("no parent commit found for commit target"));
    }

    #[tokio::test]
    async fn test_empty_author_login_adds_nothing() {
        let scm = Arc::new(MockScmService::new());
        scm.set_commits(vec![
            make_commit("target", "bob", &[]),
            make_commit("s1", "", &[]),
        ]);
        let factory = MockScmFactory::new(scm);
        let rule = Rule {
            assign_author_to_pull_requests: true,
            ..Rule::default()
        };
        let set = assignees_for(&rule, &pipeline(), &factory).await.unwrap();
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn test_static_assignees_without_inference() {
        let factory = MockScmFactory::new(Arc::new(MockScmService::new()));
        let rule = Rule {
            pull_request_assignees: vec!["a".to_string(), "b".to_string(), "a".to_string()],
            ..Rule::default()
        };
        let set = assignees_for(&rule, &PipelineContext::default(), &factory).await.unwrap();
        assert_eq!(set.logins(), vec!["a", "b"]);
        assert!(factory.service_calls().is_empty());
    }

    #[tokio::test]
    async fn test_inference_needs_pipeline_repository() {
        let factory = MockScmFactory::new(Arc::new(MockScmService::new()));
        let rule = Rule {
            assign_author_to_pull_requests: true,
            ..Rule::default()
        };
        let err = assignees_for(&rule, &PipelineContext::default(), &factory)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Assignment(_)));
    }

    #[tokio::test]
    async fn test_empty_set_makes_no_call() {
        let scm = MockScmService::new();
        let pr = make_pr(1, "b", "main", "t", &[]);
        assign(&scm, &pr, &AssigneeSet::default()).await.unwrap();
        assert!(scm.assign_calls().is_empty());

        let mut set = AssigneeSet::default();
        set.insert("carol", AssigneeReason::ParentCommitAuthor);
        assign(&scm, &pr, &set).await.unwrap();
        assert_eq!(scm.assign_calls(), vec![(1, vec!["carol".to_string()])]);
    }
}

mod sparse_test {
    use updatebot::changes::sparse_checkout_patterns;
    use updatebot::config::{Change, ChangeKind, CommandChange, GoChange, RegexChange, Rule};
    use updatebot::error::Error;

    #[test]
    fn test_go_and_regex_patterns_deduplicated() {
        let rule = Rule {
            changes: vec![
                Change::Regex(RegexChange {
                    files: vec!["go.mod".to_string(), "charts/values.yaml".to_string()],
                    globs: vec!["**/*.tf".to_string()],
                    ..RegexChange::default()
                }),
                Change::Go(GoChange::default()),
            ],
            ..Rule::default()
        };
        assert_eq!(
            sparse_checkout_patterns(&rule).unwrap(),
            vec!["go.mod", "charts/values.yaml", "**/*.tf", "go.sum", "vendor/"]
        );
    }

    #[test]
    fn test_command_fails_regardless_of_other_changes() {
        let rule = Rule {
            changes: vec![
                Change::Go(GoChange::default()),
                Change::Command(CommandChange::default()),
            ],
            ..Rule::default()
        };
        let err = sparse_checkout_patterns(&rule).unwrap_err();
        assert!(matches!(
            err,
            Error::SparseCheckoutUnsupported(ChangeKind::Command)
        ));
        assert_eq!(err.to_string(), "sparse checkout not supported for command change");
    }
}

mod changes_test {
    use crate::common::FakeRunner;
    use std::fs;
    use updatebot::changes::{ChangeContext, ChangeOutcome, apply_change};
    use updatebot::config::{Change, GoChange, RegexChange, VersionStreamChange};

    #[tokio::test]
    async fn test_unknown_change_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::default();
        let ctx = ChangeContext {
            version: "1.2.3",
            runner: &runner,
        };
        let outcome = apply_change(&ctx, dir.path(), "https://github.com/acme/app", &Change::Unknown)
            .await
            .unwrap();
        assert_eq!(outcome, ChangeOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_optional_regex_leaves_files_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("values.yaml"), "image: app:1.0.0\r\n").unwrap();
        let runner = FakeRunner::default();
        let ctx = ChangeContext {
            version: "1.2.3",
            runner: &runner,
        };
        let change = Change::Regex(RegexChange {
            pattern: "version: (.*)".to_string(),
            globs: vec!["*.yml".to_string()],
            ..RegexChange::default()
        });
        let outcome = apply_change(&ctx, dir.path(), "", &change).await.unwrap();
        assert_eq!(outcome, ChangeOutcome::Unchanged);
        assert_eq!(
            fs::read(dir.path().join("values.yaml")).unwrap(),
            b"image: app:1.0.0\r\n"
        );
    }

    #[tokio::test]
    async fn test_go_change_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let go_mod = "module example.com/app\n\nrequire (\n\texample.com/lib v1.0.0 // indirect\n)\n";
        fs::write(dir.path().join("go.mod"), go_mod).unwrap();
        let runner = FakeRunner::default();
        let ctx = ChangeContext {
            version: "1.2.3",
            runner: &runner,
        };
        let change = Change::Go(GoChange {
            package: "example.com/lib".to_string(),
            ..GoChange::default()
        });

        let first = apply_change(&ctx, dir.path(), "", &change).await.unwrap();
        assert!(matches!(first, ChangeOutcome::Modified(_)));
        let after_first = fs::read_to_string(dir.path().join("go.mod")).unwrap();
        assert!(after_first.contains("\texample.com/lib v1.2.3 // indirect\n"));

        let second = apply_change(&ctx, dir.path(), "", &change).await.unwrap();
        assert_eq!(second, ChangeOutcome::Unchanged);
        assert_eq!(fs::read_to_string(dir.path().join("go.mod")).unwrap(), after_first);
        assert_eq!(runner.command_lines(), vec!["go mod tidy"]);
    }

    #[tokio::test]
    async fn test_version_stream_update_preserves_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let charts = dir.path().join("charts").join("acme");
        fs::create_dir_all(&charts).unwrap();
        fs::write(
            charts.join("app.yml"),
            "# pinned\nversion: 1.0.0\ngitUrl: https://github.com/acme/app\n",
        )
        .unwrap();
        let runner = FakeRunner::default();
        let ctx = ChangeContext {
            version: "1.2.3",
            runner: &runner,
        };
        let change = Change::VersionStream(VersionStreamChange {
            pattern: "acme/*".to_string(),
            kind: String::new(),
        });

        apply_change(&ctx, dir.path(), "", &change).await.unwrap();
        assert_eq!(
            fs::read_to_string(charts.join("app.yml")).unwrap(),
            "# pinned\nversion: 1.2.3\ngitUrl: https://github.com/acme/app\n"
        );
    }
}

mod config_test {
    use std::fs;
    use updatebot::config::{
        ChangeKind, VersionSource, config_path, load_update_config, resolve_version,
    };
    use updatebot::error::Error;

    #[test]
    fn test_load_default_config_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".jx")).unwrap();
        fs::write(
            dir.path().join(".jx/updatebot.yaml"),
            "spec:\n  rules:\n    - urls: [https://github.com/acme/app]\n      changes:\n        - command:\n            name: make\n",
        )
        .unwrap();

        let config = load_update_config(&config_path(dir.path(), None)).unwrap();
        assert_eq!(config.spec.rules.len(), 1);
        assert_eq!(config.spec.rules[0].changes[0].kind(), ChangeKind::Command);
    }

    #[test]
    fn test_version_precedence() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("VERSION"), " 2.0.0\n").unwrap();

        let from_file = resolve_version(
            dir.path(),
            &VersionSource {
                env: Some("3.0.0"),
                ..VersionSource::default()
            },
        )
        .unwrap();
        assert_eq!(from_file, "2.0.0");

        let explicit = resolve_version(
            dir.path(),
            &VersionSource {
                explicit: Some("1.0.0"),
                ..VersionSource::default()
            },
        )
        .unwrap();
        assert_eq!(explicit, "1.0.0");
    }

    #[test]
    fn test_missing_version() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_version(dir.path(), &VersionSource::default()).unwrap_err();
        assert!(matches!(err, Error::MissingOption(ref o) if o == "version"));
    }
}

mod message_test {
    use crate::common::{MockScmFactory, MockScmService};
    use std::sync::Arc;
    use updatebot::engine::{
        RunContext, application_from_url, attach_changelog, branch_name, default_title,
        git_username, scm_username,
    };

    #[test]
    fn test_pull_request_text() {
        let app = application_from_url("https://github.com/jenkins-x/jx.git").unwrap();
        assert_eq!(app, "jenkins-x/jx");
        assert_eq!(
            default_title(&app, "3.1.0"),
            "chore(deps): upgrade jenkins-x/jx to version 3.1.0"
        );
        assert_eq!(branch_name(&app, "3.1.0"), "updatebot/jenkins-x-jx-3.1.0");

        let ctx = RunContext::new("3.1.0", &app);
        let body = attach_changelog(&ctx.expand("bump {{app}} to {{version}}"), "-----", "### Fixes");
        assert_eq!(body, "bump jenkins-x/jx to 3.1.0\n\n-----\n\n### Fixes\n");
    }

    #[tokio::test]
    async fn test_service_user_is_the_commit_author() {
        let factory = MockScmFactory::new(Arc::new(MockScmService::new()));
        let login = scm_username(&factory, "https://github.com/acme/source.git").await;
        assert_eq!(login.as_deref(), Some("updatebot"));
        assert_eq!(git_username([None, login.as_deref(), Some("env-user")]), "updatebot");
        assert_eq!(factory.service_calls(), vec!["https://github.com/acme/source.git"]);
    }

    #[tokio::test]
    async fn test_no_repository_skips_the_lookup() {
        let factory = MockScmFactory::new(Arc::new(MockScmService::new()));
        assert_eq!(scm_username(&factory, " ").await, None);
        assert!(factory.service_calls().is_empty());
    }
}
