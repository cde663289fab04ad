//! Task workflow tests against a scripted server

mod common;

use common::*;
use fossdriver::error::{FossDriverError, JobError, ResolveError};
use fossdriver::server::{FormPart, Request};
use fossdriver::tasks::{
    BulkTextMatch, Copyright, CreateFolder, ImportRdf, Reuse, Scanners, SpdxExport, Task,
    TaskOutcome, Upload,
};
use pretty_assertions::assert_eq;
use std::io::Write;

fn bulk_fields(transport: &ScriptedTransport) -> Vec<Vec<(String, String)>> {
    transport
        .requests_to("/repo/?mod=change-license-bulk")
        .iter()
        .map(form_fields)
        .collect()
}

fn multipart_names(request: &Request) -> Vec<String> {
    match request {
        Request::Multipart { form, .. } => form
            .parts
            .iter()
            .map(|part| match part {
                FormPart::Text { name, .. } | FormPart::File { name, .. } => name.clone(),
            })
            .collect(),
        other => panic!("expected a multipart request, got {other:?}"),
    }
}

#[tokio::test]
async fn test_every_task_runs_against_known_names() {
    let transport = standard_server("3.6.0");
    let mut server = connect(&transport).await;
    let dir = tempfile::tempdir().unwrap();
    let rdf = dir.path().join("burrow.rdf");
    std::fs::write(&rdf, SPDX_RDF_REPORT).unwrap();

    let mut bulk = BulkTextMatch::new("burrow-1.0.tar.gz", "Burrow", "Licensed under MIT");
    bulk.add("MIT");

    let tasks: Vec<Task> = vec![
        Scanners::new("burrow-1.0.tar.gz", "Burrow").into(),
        Copyright::new("burrow-1.0.tar.gz", "Burrow").into(),
        Reuse::new("burrow-2.0.tar.gz", "Burrow", "burrow-1.0.tar.gz", "Burrow").into(),
        bulk.into(),
        ImportRdf::new(&rdf, "burrow-1.0.tar.gz", "Burrow").into(),
    ];
    for task in &tasks {
        assert_eq!(
            task.run(&mut server).await.unwrap(),
            TaskOutcome::Completed,
            "{task}"
        );
    }
}

#[tokio::test]
async fn test_scanners_waits_for_monk_and_nomos() {
    let transport = standard_server("3.6.0");
    let mut server = connect(&transport).await;

    Task::from(Scanners::new("burrow-1.0.tar.gz", "Burrow"))
        .run(&mut server)
        .await
        .unwrap();

    let polled: Vec<String> = transport
        .requests_to("/repo/?mod=ajaxShowJobs&do=showSingleJob")
        .iter()
        .map(|r| r.url().rsplit('=').next().unwrap_or_default().to_string())
        .collect();
    assert_eq!(polled, vec!["201", "202"]);
}

#[tokio::test]
async fn test_rerunning_a_task_submits_a_new_job() {
    let transport = standard_server("3.6.0");
    let mut server = connect(&transport).await;
    let task = Task::from(Copyright::new("burrow-1.0.tar.gz", "Burrow"));

    task.run(&mut server).await.unwrap();
    task.run(&mut server).await.unwrap();

    let submissions = transport.requests_to("/repo/?mod=agent_add");
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0], submissions[1]);
}

#[tokio::test]
async fn test_unknown_upload_fails_at_run() {
    let transport = standard_server("3.6.0");
    let mut server = connect(&transport).await;

    let task = Task::from(Scanners::new("missing.tar.gz", "Burrow"));
    let err = task.run(&mut server).await.unwrap_err();
    assert!(matches!(
        err,
        FossDriverError::Resolve(ResolveError::UploadNotFound { .. })
    ));
    assert!(transport.requests_to("/repo/?mod=agent_add").is_empty());
}

#[tokio::test]
async fn test_bulk_actions_are_submitted_in_order() {
    let transport = standard_server("3.6.0");
    let mut server = connect(&transport).await;

    let mut task = BulkTextMatch::new("burrow-1.0.tar.gz", "Burrow", "Permission is hereby granted");
    task.add("MIT").remove("GPL-2.0");
    assert_eq!(task.actions().len(), 2);

    Task::from(task).run(&mut server).await.unwrap();

    let submitted = bulk_fields(&transport);
    assert_eq!(submitted.len(), 1);
    let fields = &submitted[0];
    assert_eq!(field(fields, "refText"), Some("Permission is hereby granted"));
    assert_eq!(field(fields, "bulkScope"), Some("u"));
    assert_eq!(field(fields, "uploadTreeId"), Some("340"));
    assert_eq!(field(fields, "forceDecision"), Some("0"));
    assert_eq!(
        fields[4..].to_vec(),
        vec![
            ("bulkAction[0][licenseId]".to_string(), "308".to_string()),
            ("bulkAction[0][licenseName]".to_string(), "MIT".to_string()),
            ("bulkAction[0][action]".to_string(), "Add".to_string()),
            ("bulkAction[1][licenseId]".to_string(), "215".to_string()),
            ("bulkAction[1][licenseName]".to_string(), "GPL-2.0".to_string()),
            ("bulkAction[1][action]".to_string(), "Remove".to_string()),
        ]
    );
    assert_eq!(transport.requests_to("/repo/?mod=view-license").len(), 1);
}

#[tokio::test]
async fn test_bulk_actions_are_lowercase_on_older_servers() {
    let transport = standard_server("3.4.0");
    let mut server = connect(&transport).await;

    let mut task = BulkTextMatch::new("burrow-1.0.tar.gz", "Burrow", "text");
    task.remove("MIT");
    Task::from(task).run(&mut server).await.unwrap();

    let fields = &bulk_fields(&transport)[0];
    assert_eq!(field(fields, "bulkAction[0][action]"), Some("remove"));
}

#[tokio::test]
async fn test_bulk_unknown_license_fails_at_run_not_construction() {
    let transport = standard_server("3.6.0");
    let mut server = connect(&transport).await;

    let mut task = BulkTextMatch::new("burrow-1.0.tar.gz", "Burrow", "text");
    task.add("MIT").add("Not-A-License");
    assert_eq!(task.actions().len(), 2);

    let err = Task::from(task).run(&mut server).await.unwrap_err();
    assert!(matches!(
        err,
        FossDriverError::Resolve(ResolveError::LicenseNotFound { ref name }) if name == "Not-A-License"
    ));
    assert!(bulk_fields(&transport).is_empty());
}

#[tokio::test]
async fn test_bulk_without_server_licenses() {
    let transport = standard_server("3.6.0");
    transport.on("/repo/?mod=view-license", "<html><body>No licenses</body></html>");
    let mut server = connect(&transport).await;

    let mut task = BulkTextMatch::new("burrow-1.0.tar.gz", "Burrow", "text");
    task.add("MIT");
    let err = Task::from(task).run(&mut server).await.unwrap_err();
    assert!(matches!(
        err,
        FossDriverError::Resolve(ResolveError::NoLicenses { .. })
    ));
}

#[tokio::test]
async fn test_upload_task() {
    let transport = standard_server("3.6.0");
    let mut server = connect(&transport).await;
    let mut archive = tempfile::Builder::new()
        .prefix("burrow-3.0")
        .suffix(".tar.gz")
        .tempfile()
        .unwrap();
    archive.write_all(b"\x1f\x8b archive").unwrap();

    let outcome = Task::from(Upload::new(archive.path(), "Burrow"))
        .run(&mut server)
        .await
        .unwrap();
    assert_eq!(outcome, TaskOutcome::Uploaded { upload_id: 42 });

    let posts: Vec<Request> = transport
        .requests_to("/repo/?mod=upload_file")
        .into_iter()
        .filter(|r| r.method() == "POST")
        .collect();
    assert_eq!(posts.len(), 1);
    let names = multipart_names(&posts[0]);
    assert_eq!(
        names,
        vec![
            "uploadformbuild",
            "folder",
            "fileInput",
            "descriptionInputName",
            "public",
            "Check_agent_bucket",
            "Check_agent_copyright",
            "Check_agent_ecc",
            "Check_agent_mimetype",
            "Check_agent_nomos",
            "Check_agent_monk",
            "Check_agent_pkgagent",
            "deciderRules[]",
        ]
    );
    let Request::Multipart { form, .. } = &posts[0] else {
        unreachable!()
    };
    assert_eq!(form.text_value("uploadformbuild"), Some("build-token-1"));
    assert_eq!(form.text_value("folder"), Some("4"));
    assert_eq!(form.text_value("public"), Some("private"));
}

#[tokio::test]
async fn test_upload_without_id_fails() {
    let transport = standard_server("3.6.0");
    transport.on_post("/repo/?mod=upload_file", "<html><p>Upload failed</p></html>");
    let mut server = connect(&transport).await;
    let archive = tempfile::Builder::new().suffix(".zip").tempfile().unwrap();

    let err = Task::from(Upload::new(archive.path(), "Burrow"))
        .run(&mut server)
        .await
        .unwrap_err();
    assert!(matches!(err, FossDriverError::Job(JobError::NoUploadId { .. })));
}

#[tokio::test]
async fn test_upload_missing_file_is_io_error() {
    let transport = standard_server("3.6.0");
    let mut server = connect(&transport).await;

    let err = Task::from(Upload::new("/nonexistent/burrow.tar.gz", "Burrow"))
        .run(&mut server)
        .await
        .unwrap_err();
    assert!(matches!(err, FossDriverError::Io { .. }));
}

#[tokio::test]
async fn test_create_folder_confirms_creation() {
    let transport = standard_server("3.6.0");
    transport.once(
        "/repo/?mod=upload_file",
        folders_page(&[(1, "Software Repository"), (4, "Burrow")]),
    );
    transport.on(
        "/repo/?mod=upload_file",
        folders_page(&[(1, "Software Repository"), (4, "Burrow"), (9, "Burrow 2.0")]),
    );
    let mut server = connect(&transport).await;

    let outcome = Task::from(CreateFolder::new("Burrow 2.0", "Burrow"))
        .run(&mut server)
        .await
        .unwrap();
    assert_eq!(outcome, TaskOutcome::Completed);

    let fields = form_fields(&transport.requests_to("/repo/?mod=folder_create")[0]);
    assert_eq!(field(&fields, "parentid"), Some("4"));
    assert_eq!(field(&fields, "newname"), Some("Burrow 2.0"));
    assert_eq!(field(&fields, "description"), Some("Burrow 2.0"));
}

#[tokio::test]
async fn test_create_folder_that_never_appears() {
    let transport = standard_server("3.6.0");
    let mut server = connect(&transport).await;

    let err = Task::from(CreateFolder::new("Ghost", "Software Repository"))
        .run(&mut server)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FossDriverError::Job(JobError::FolderNotCreated { .. })
    ));
}

#[tokio::test]
async fn test_create_folder_with_existing_name_is_not_created() {
    let transport = standard_server("3.6.0");
    transport.on(
        "/repo/?mod=folder_create",
        "<html>Folder Burrow already exists</html>",
    );
    let mut server = connect(&transport).await;

    let err = Task::from(CreateFolder::new("Burrow", "Software Repository"))
        .run(&mut server)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FossDriverError::Job(JobError::FolderNotCreated { name }) if name == "Burrow"
    ));
}

#[tokio::test]
async fn test_create_folder_next_to_same_name() {
    let transport = standard_server("3.6.0");
    transport.once(
        "/repo/?mod=upload_file",
        folders_page(&[(1, "Software Repository"), (4, "Burrow")]),
    );
    transport.on(
        "/repo/?mod=upload_file",
        folders_page(&[(1, "Software Repository"), (4, "Burrow"), (11, "Burrow")]),
    );
    let mut server = connect(&transport).await;

    let outcome = Task::from(CreateFolder::new("Burrow", "Burrow"))
        .run(&mut server)
        .await
        .unwrap();
    assert_eq!(outcome, TaskOutcome::Completed);
    let fields = form_fields(&transport.requests_to("/repo/?mod=folder_create")[0]);
    assert_eq!(field(&fields, "parentid"), Some("4"));
}

#[tokio::test]
async fn test_create_folder_unknown_parent() {
    let transport = standard_server("3.6.0");
    let mut server = connect(&transport).await;

    let err = Task::from(CreateFolder::new("Burrow 2.0", "Nowhere"))
        .run(&mut server)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FossDriverError::Resolve(ResolveError::FolderNotFound { name }) if name == "Nowhere"
    ));
    assert!(transport.requests_to("/repo/?mod=folder_create").is_empty());
}

#[tokio::test]
async fn test_spdx_exports_write_reports() {
    let transport = standard_server("3.6.0");
    let mut server = connect(&transport).await;
    let dir = tempfile::tempdir().unwrap();

    let tv_path = dir.path().join("burrow.spdx");
    let outcome = Task::SpdxTv(SpdxExport::new("burrow-1.0.tar.gz", "Burrow", &tv_path))
        .run(&mut server)
        .await
        .unwrap();
    assert_eq!(outcome, TaskOutcome::ReportWritten { path: tv_path.clone() });
    assert_eq!(std::fs::read_to_string(&tv_path).unwrap(), SPDX_TV_REPORT);

    let rdf_path = dir.path().join("burrow.rdf");
    Task::SpdxRdf(SpdxExport::new("burrow-1.0.tar.gz", "Burrow", &rdf_path))
        .run(&mut server)
        .await
        .unwrap();
    assert_eq!(std::fs::read_to_string(&rdf_path).unwrap(), SPDX_RDF_REPORT);

    let downloads: Vec<String> = transport
        .requests_to("/repo/?mod=download")
        .iter()
        .map(|r| r.url().to_string())
        .collect();
    assert_eq!(
        downloads,
        vec![
            "http://fossy.test/repo/?mod=download&report=9",
            "http://fossy.test/repo/?mod=download&report=10",
        ]
    );
}

#[tokio::test]
async fn test_import_rdf_form() {
    let transport = standard_server("3.6.0");
    let mut server = connect(&transport).await;
    let dir = tempfile::tempdir().unwrap();
    let rdf = dir.path().join("decisions.rdf");
    std::fs::write(&rdf, SPDX_RDF_REPORT).unwrap();

    Task::from(ImportRdf::new(&rdf, "burrow-2.0.tar.gz", "Burrow"))
        .run(&mut server)
        .await
        .unwrap();

    let request = &transport.requests_to("/repo/?mod=ui_reportImport")[0];
    assert_eq!(
        multipart_names(request),
        vec![
            "oldfolderid",
            "uploadselect",
            "report",
            "addNewLicensesAs",
            "addConcludedAsDecisions",
            "addConcludedAsDecisionsOverwrite",
        ]
    );
    let Request::Multipart { form, .. } = request else {
        unreachable!()
    };
    assert_eq!(form.text_value("oldfolderid"), Some("4"));
    assert_eq!(form.text_value("uploadselect"), Some("13"));
    assert_eq!(form.text_value("addNewLicensesAs"), Some("license"));
    assert_eq!(transport.requests_to("/repo/?mod=upload_file").len(), 1);
}

#[tokio::test]
async fn test_job_timeout_from_config_applies_to_tasks() {
    let transport = standard_server("3.6.0");
    transport.on(
        "/repo/?mod=ajaxShowJobs&do=showSingleJob&jobId=301",
        single_job_json(301, "copyright", "Started", None),
    );
    let mut config = config();
    config.job_timeout_secs = Some(0);
    let mut server = fossdriver::server::FossServer::connect(config, transport.clone())
        .await
        .unwrap();

    let err = Task::from(Copyright::new("burrow-1.0.tar.gz", "Burrow"))
        .run(&mut server)
        .await
        .unwrap_err();
    assert!(matches!(err, FossDriverError::Job(JobError::Timeout { .. })));
}
