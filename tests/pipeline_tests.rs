//! End-to-end pipeline tests: tag injection, metadata generation,
//! handler reconciliation, error extraction and repeated-run
//! stability over a real project layout.

use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use protosync::pipeline;
use protosync::Config;

const SCHEMA: &str = r#"syntax = "proto3";

package member.api;

option crate_path = "crate::pb";

message ModelMember {
    string id = 1;
    // @store: nick
    string nickname = 2;
    // @index: idx_email asc
    string email = 3;
}

message CreateReq {
    bool invalid = 1;
}

message CreateResp {
}

message DeleteReq {
}

message DeleteResp {
}

// @route_prefix: /api/member
// @emit_to: src/handler/member.rs
service MemberAPI {
    rpc Create (CreateReq) returns (CreateResp);
    rpc Delete (DeleteReq) returns (DeleteResp);
}

enum ErrCode {
    BAD_INPUT = 1001; // invalid input
}
"#;

const HANDLER: &str = r#"pub struct MemberAPIImpl;

impl MemberAPIImpl {
    pub async fn create(&self, req: CreateReq) -> Result<CreateResp, core::Error> {
        for _ in 0..1 {
            if req.invalid {
                return Err(core::create_error(member_api::BAD_INPUT));
            }
        }
        Err(core::create_error(errpkg::NOT_FOUND))
    }
}
"#;

struct Project {
    dir: TempDir,
    config: Config,
}

impl Project {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("proto")).unwrap();
        std::fs::write(dir.path().join("proto/member.proto"), SCHEMA).unwrap();
        std::fs::create_dir_all(dir.path().join("src/handler")).unwrap();
        std::fs::write(dir.path().join("src/handler/member.rs"), HANDLER).unwrap();

        let mut config = Config::default();
        config.schema_path = dir.path().join("proto");
        config.project_root = dir.path().to_path_buf();
        Self { dir, config }
    }

    fn run(&self) -> pipeline::RunSummary {
        pipeline::run(&self.config).unwrap()
    }

    fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(rel)).unwrap()
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }
}

#[test]
fn schema_gains_sorted_error_facts_from_the_handler_body() {
    let project = Project::new();
    let summary = project.run();
    assert!(summary.ok(), "failures: {:?}", summary.failed);

    let schema = project.read("proto/member.proto");
    let error_pos = schema.find("// @error:").expect("error block written");
    let bad = schema.find("// \tBAD_INPUT").unwrap();
    let foreign = schema.find("// \terrpkg.NOT_FOUND").unwrap();
    assert!(error_pos < bad && bad < foreign, "facts sorted after label");

    // only the implemented rpc gained a block
    assert_eq!(schema.matches("// @error:").count(), 1);
}

#[test]
fn missing_handler_declarations_are_appended_without_touching_bodies() {
    let project = Project::new();
    project.run();

    let handler = project.read("src/handler/member.rs");
    assert!(handler.starts_with("pub struct MemberAPIImpl;"));
    assert!(handler.contains("Err(core::create_error(errpkg::NOT_FOUND))"));
    assert_eq!(handler.matches("pub async fn create").count(), 1);
    assert!(handler.contains("pub async fn delete"));
    assert!(handler.contains("pub fn bind(&self) {}"));
}

#[test]
fn metadata_and_route_tables_are_generated_beside_the_schema() {
    let project = Project::new();
    project.run();

    let metadata = project.read("proto/autogen_model_member.rs");
    assert!(metadata.contains("pub mod model_member {"));
    assert!(metadata.contains("pub const TABLE: &str = \"member\";"));
    assert!(metadata.contains("pub const ID: &str = \"_id\";"));
    assert!(metadata.contains("pub const NICKNAME: &str = \"nick\";"));
    assert!(metadata.contains("(\"idx_email\", false, false, 0, &[(\"email\", 1), ]),"));
    assert!(metadata.contains("pub const BAD_INPUT: i64 = 1001; // invalid input"));

    let routes = project.read("proto/autogen_router_member.rs");
    assert!(routes.contains("pub const MEMBER_API_ROUTES"));
    assert!(routes.contains("(\"POST\", \"/api/member/create\", \"create\"),"));
    assert!(routes.contains("(\"POST\", \"/api/member/delete\", \"delete\"),"));
    // per-route errors reflect the synchronized labels
    assert!(routes.contains("pub const MEMBER_API_ERRORS"));
    assert!(routes.contains("(\"create\", &[\"BAD_INPUT\", \"errpkg.NOT_FOUND\", ]),"));
}

#[test]
fn repeated_runs_are_stable() {
    let project = Project::new();
    project.run();
    let schema_once = project.read("proto/member.proto");
    let handler_once = project.read("src/handler/member.rs");
    let metadata_once = project.read("proto/autogen_model_member.rs");
    let routes_once = project.read("proto/autogen_router_member.rs");

    project.run();
    assert_eq!(project.read("proto/member.proto"), schema_once);
    assert_eq!(project.read("src/handler/member.rs"), handler_once);
    assert_eq!(project.read("proto/autogen_model_member.rs"), metadata_once);
    assert_eq!(project.read("proto/autogen_router_member.rs"), routes_once);
}

#[test]
fn the_original_document_is_restored_after_the_run() {
    let project = Project::new();
    project.run();

    assert!(project.path("proto/member.proto").exists());
    assert!(!project.path("proto/origin_member.proto").exists());
    // the injected intermediate never leaks tag lines into the source
    assert!(!project.read("proto/member.proto").contains("@attr:"));
}

#[test]
fn failed_documents_do_not_stop_the_batch() {
    let project = Project::new();
    std::fs::write(
        project.path("proto/broken.proto"),
        "message Broken {\n    string name 1;\n}\n",
    )
    .unwrap();

    let summary = pipeline::run(&project.config).unwrap();
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.processed.len(), 1);
    assert!(summary.failed[0].0.ends_with(Path::new("broken.proto")));
    // the failed document is restored under its own name
    assert!(project.path("proto/broken.proto").exists());
}

#[test]
fn index_conflicts_abort_the_document() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("proto")).unwrap();
    std::fs::write(
        dir.path().join("proto/conflict.proto"),
        r#"syntax = "proto3";

package conflict.api;

message ModelThing {
    // @index: idx1 asc
    string f1 = 1;
    // @unique_index: idx1 asc
    string f2 = 2;
}
"#,
    )
    .unwrap();

    let mut config = Config::default();
    config.schema_path = dir.path().join("proto");
    config.project_root = dir.path().to_path_buf();

    let summary = pipeline::run(&config).unwrap();
    assert_eq!(summary.failed.len(), 1);
    assert!(summary.failed[0].1.to_string().contains("idx1"));
}
