//! Scripted FOSSology server for integration tests
//!
//! [`ScriptedTransport`] answers requests from canned pages keyed by
//! endpoint and records every request it receives, so tests can check
//! exactly what would have gone over the wire.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use fossdriver::config::FossConfig;
use fossdriver::error::SessionError;
use fossdriver::server::{FossServer, Page, Request, Transport};

pub const BASE_URL: &str = "http://fossy.test";

#[derive(Debug)]
struct Route {
    method: Option<&'static str>,
    endpoint: String,
    exact: bool,
    queued: VecDeque<Page>,
    sticky: Option<Page>,
}

impl Route {
    fn score(&self, method: &str, endpoint: &str) -> Option<usize> {
        if self.method.is_some_and(|m| m != method) {
            return None;
        }
        let matched = if self.exact {
            endpoint == self.endpoint
        } else {
            endpoint.starts_with(&self.endpoint)
        };
        if !matched || (self.queued.is_empty() && self.sticky.is_none()) {
            return None;
        }
        Some(self.endpoint.len() * 2 + usize::from(self.method.is_some()))
    }
}

#[derive(Debug, Default)]
struct Script {
    routes: Vec<Route>,
    requests: Vec<Request>,
}

/// In-memory transport answering from scripted pages
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn route_mut<'a>(
        script: &'a mut Script,
        method: Option<&'static str>,
        endpoint: &str,
        exact: bool,
    ) -> &'a mut Route {
        let index = script
            .routes
            .iter()
            .position(|r| r.method == method && r.endpoint == endpoint && r.exact == exact);
        let index = match index {
            Some(i) => i,
            None => {
                script.routes.push(Route {
                    method,
                    endpoint: endpoint.to_string(),
                    exact,
                    queued: VecDeque::new(),
                    sticky: None,
                });
                script.routes.len() - 1
            }
        };
        &mut script.routes[index]
    }

    fn set(&self, method: Option<&'static str>, endpoint: &str, exact: bool, body: impl Into<String>, once: bool) {
        let mut script = self.script.lock().unwrap();
        let route = Self::route_mut(&mut script, method, endpoint, exact);
        if once {
            route.queued.push_back(Page::ok(body));
        } else {
            route.sticky = Some(Page::ok(body));
        }
    }

    /// Answer every request whose endpoint starts with `endpoint`
    pub fn on(&self, endpoint: &str, body: impl Into<String>) -> &Self {
        self.set(None, endpoint, false, body, false);
        self
    }

    /// Like [`on`](Self::on) but only for POST requests
    pub fn on_post(&self, endpoint: &str, body: impl Into<String>) -> &Self {
        self.set(Some("POST"), endpoint, false, body, false);
        self
    }

    /// Answer the next matching request only, before any standing answer
    pub fn once(&self, endpoint: &str, body: impl Into<String>) -> &Self {
        self.set(None, endpoint, false, body, true);
        self
    }

    /// Answer requests for exactly `endpoint`
    pub fn on_exact(&self, endpoint: &str, body: impl Into<String>) -> &Self {
        self.set(None, endpoint, true, body, false);
        self
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<Request> {
        self.script.lock().unwrap().requests.clone()
    }

    /// Requests whose endpoint starts with `endpoint`
    pub fn requests_to(&self, endpoint: &str) -> Vec<Request> {
        let url = format!("{}{}", BASE_URL, endpoint);
        self.requests()
            .into_iter()
            .filter(|r| r.url().starts_with(&url))
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &Request) -> Result<Page, SessionError> {
        let mut script = self.script.lock().unwrap();
        script.requests.push(request.clone());

        let endpoint = request.url().strip_prefix(BASE_URL).unwrap_or(request.url());
        let best = script
            .routes
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.score(request.method(), endpoint).map(|s| (s, i)))
            .max_by_key(|(score, i)| (*score, std::cmp::Reverse(*i)));

        let Some((_, index)) = best else {
            return Ok(Page {
                status: 404,
                body: format!("no scripted page for {}", endpoint),
            });
        };
        let route = &mut script.routes[index];
        match route.queued.pop_front() {
            Some(page) => Ok(page),
            None => Ok(route.sticky.clone().unwrap_or_else(|| Page::ok(""))),
        }
    }
}

/// Fields of a form request, in submission order
pub fn form_fields(request: &Request) -> Vec<(String, String)> {
    match request {
        Request::Form { fields, .. } => fields.clone(),
        other => panic!("expected a form request, got {other:?}"),
    }
}

pub fn field<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

pub fn config() -> FossConfig {
    FossConfig::new(BASE_URL, "fossy", "fossy").unwrap()
}

pub async fn connect(transport: &ScriptedTransport) -> FossServer<ScriptedTransport> {
    FossServer::connect(config(), transport.clone()).await.unwrap()
}

// ---- pages ----

pub fn version_page(version: &str) -> String {
    format!(
        r#"<html><body><div id="footer"><span id="versionInfo">Version: [{version}], Branch: [master], Commit: [#0a1b2c] 2019/08/01 09:00 built @ 2019/08/01</span></div></body></html>"#
    )
}

pub fn login_page() -> String {
    "<html><body><p>Welcome to FOSSology</p></body></html>".to_string()
}

pub fn rejected_login_page() -> String {
    "<html><body><p>The combination of user name and password was not found.</p></body></html>"
        .to_string()
}

pub fn timed_out_page() -> String {
    "<html><body><p>Your session timed out, please log in again.</p></body></html>".to_string()
}

pub fn folders_page(folders: &[(u64, &str)]) -> String {
    let options: String = folders
        .iter()
        .map(|(id, name)| format!(r#"<option value="{id}">&nbsp;&nbsp;{name}</option>"#))
        .collect();
    format!(
        r#"<html><body><form enctype="multipart/form-data" method="post">
        <input type="hidden" name="uploadformbuild" value="build-token-1"/>
        <select name="folder" id="folder">{options}</select>
        <input type="file" name="fileInput"/></form></body></html>"#
    )
}

pub fn uploads_json(uploads: &[(u64, &str, u64)]) -> String {
    let rows: Vec<Value> = uploads
        .iter()
        .map(|(id, name, item)| {
            json!([
                format!("<a href='?mod=license&upload={id}&item={item}&show=detail'><b>{name}</b></a>"),
                "",
                [id, 3],
                ""
            ])
        })
        .collect();
    json!({ "sEcho": 1, "iTotalRecords": rows.len(), "aaData": rows }).to_string()
}

pub fn upload_result_page(upload_id: u64) -> String {
    format!(
        r#"<html><body><p>The file was uploaded.</p><a href="/repo/?mod=showjobs&upload={upload_id}">View jobs</a></body></html>"#
    )
}

pub fn licenses_page(licenses: &[(u64, &str)]) -> String {
    let options: String = licenses
        .iter()
        .map(|(id, name)| format!(r#"<option value="{id}">{name}</option>"#))
        .collect();
    format!(
        r#"<html><body><select id="bulkLicense" name="bulkLicense"><option value="">-- select --</option>{options}</select></body></html>"#
    )
}

/// `showjb` answer of a 3.5.0+ server
pub fn show_jobs_json(jobs: &[(u64, &str, &str)]) -> String {
    let entries: Vec<Value> = jobs
        .iter()
        .map(|(id, agent, status)| {
            json!({ "job": { "jobQueue": { (id.to_string()): { "jq_type": agent, "jq_endtext": status } } } })
        })
        .collect();
    json!({ "showJobsData": entries }).to_string()
}

/// `showjb` answer of a pre-3.5.0 server: an HTML table inside a JSON string
pub fn show_jobs_legacy(jobs: &[(u64, &str, &str)]) -> String {
    let rows: String = jobs
        .iter()
        .map(|(id, agent, status)| {
            format!(
                "<tr class='jobQueued'><td><a href='?mod=showjobs&job={id}'>{id}</a></td><td>{status}</td><td>{agent}</td><td></td><td></td><td></td><td></td><td></td></tr>"
            )
        })
        .collect();
    json!({ "showJobsData": format!("<table><tr><th>Job</th></tr>{rows}</table>") }).to_string()
}

/// `showSingleJob` answer
pub fn single_job_json(id: u64, agent: &str, status: &str, report_id: Option<u64>) -> String {
    let mut rows: Vec<Value> = (0..12).map(|i| json!({ "0": format!("Row {i}"), "1": "" })).collect();
    rows[0]["1"] = Value::from(format!("<a href='?mod=showjobs&job={id}'>{id}</a>"));
    rows[1]["1"] = Value::from(report_id.map(|r| r.to_string()).unwrap_or_default());
    rows[3]["1"] = Value::from(agent);
    rows[11]["1"] = Value::from(format!("{status}<br>2019-08-01 09:00:00"));
    json!({ "aaData": rows }).to_string()
}

pub fn summary_page() -> String {
    r#"<html><body><table id="licsummary">
        <tr><td>Unique licenses</td><td>5</td><td>1,024</td><td>Files</td></tr>
        <tr><td>Unique scanner detected licenses</td><td>4</td><td>2</td><td>Unique concluded licenses</td></tr>
        <tr><td>Licenses found</td><td>300</td><td>12</td><td>Licenses concluded</td></tr>
        <tr><td>Files with no detected licenses</td><td>700</td><td>3</td><td>Concluded files with no detected licenses</td></tr>
        </table></body></html>"#
        .to_string()
}

pub const SPDX_TV_REPORT: &str = "SPDXVersion: SPDX-2.1\nDataLicense: CC0-1.0\nPackageName: burrow\n";
pub const SPDX_RDF_REPORT: &str = "<?xml version=\"1.0\"?><rdf:RDF></rdf:RDF>";

/// Every job the standard server knows, all completed
pub const JOBS: [(u64, &str); 10] = [
    (101, "ununpack"),
    (102, "adj2nest"),
    (201, "monk"),
    (202, "nomos"),
    (301, "copyright"),
    (401, "reuser"),
    (501, "monkbulk"),
    (601, "spdx2tv"),
    (602, "spdx2"),
    (701, "reportImport"),
];

/// A server at `version` with folder "Burrow" (4) holding uploads
/// "burrow-1.0.tar.gz" (12, item 340) and "burrow-2.0.tar.gz" (13, item 360),
/// where every agent job has completed.
pub fn standard_server(version: &str) -> ScriptedTransport {
    let transport = ScriptedTransport::new();
    transport
        .on("/repo/?mod=auth", login_page())
        .on_exact("/repo/", version_page(version))
        .on(
            "/repo/?mod=upload_file",
            folders_page(&[(1, "Software Repository"), (4, "Burrow")]),
        )
        .on_post("/repo/?mod=upload_file", upload_result_page(42))
        .on(
            "/repo/?mod=browse-processPost",
            uploads_json(&[(12, "burrow-1.0.tar.gz", 340), (13, "burrow-2.0.tar.gz", 360)]),
        )
        .on("/repo/?mod=agent_add", "<html>Job added</html>")
        .on("/repo/?mod=folder_create", "<html>Folder created</html>")
        .on("/repo/?mod=view-license", licenses_page(&[(215, "GPL-2.0"), (308, "MIT")]))
        .on("/repo/?mod=license&", summary_page())
        .on("/repo/?mod=change-license-bulk", "{\"jqid\": 501}")
        .on("/repo/?mod=ui_spdx2", "<html>Report generation queued</html>")
        .on("/repo/?mod=ui_reportImport", "<html>Import queued</html>")
        .on("/repo/?mod=download&report=9", SPDX_TV_REPORT)
        .on("/repo/?mod=download&report=10", SPDX_RDF_REPORT);

    let completed: Vec<(u64, &str, &str)> = JOBS.iter().map(|(id, agent)| (*id, *agent, "Completed")).collect();
    let jobs = if fossdriver::parser::ServerVersion::parse(version)
        .map(|v| v.is_at_least("3.5.0"))
        .unwrap_or(true)
    {
        show_jobs_json(&completed)
    } else {
        show_jobs_legacy(&completed)
    };
    transport.on("/repo/?mod=ajaxShowJobs&do=showjb", jobs);

    for (id, agent) in JOBS {
        let report = match agent {
            "spdx2tv" => Some(9),
            "spdx2" => Some(10),
            _ => None,
        };
        transport.on(
            &format!("/repo/?mod=ajaxShowJobs&do=showSingleJob&jobId={id}"),
            single_job_json(id, agent, "Completed", report),
        );
    }
    transport
}
