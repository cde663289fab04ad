//! Parsers for HTML pages and the upload browser JSON

use serde_json::Value;

use super::html::{element_by_id, elements, elements_with_attr, strip_tags};
use super::{LicenseSummary, ParsedFolder, ParsedLicense, ParsedUpload, ServerVersion};
use crate::error::ParseError;

/// Leading decimal digits of `text`, if any
fn leading_number(text: &str) -> Option<u64> {
    let digits: String = text
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Number following `key` in a URL such as `?mod=browse&upload=12&item=40`
fn query_number(href: &str, key: &str) -> Option<u64> {
    let (_, rest) = href.split_once(key)?;
    leading_number(rest)
}

/// Extract the server version from the `/repo/` landing page
///
/// The footer carries `<span id="versionInfo">Version: [3.6.0], ...`.
pub fn parse_version_number(html: &str) -> Result<ServerVersion, ParseError> {
    let info = element_by_id(html, "versionInfo")
        .ok_or_else(|| ParseError::missing("#versionInfo element", "version"))?;
    let text = info.text();
    let raw = text
        .split_once("Version: [")
        .and_then(|(_, rest)| rest.split_once(']'))
        .map(|(version, _)| version)
        .ok_or_else(|| ParseError::invalid("version info", text.as_str(), "version"))?;
    ServerVersion::parse(raw).ok_or_else(|| ParseError::invalid("version number", raw, "version"))
}

/// Every folder listed in the `folder` selectors, in page order
///
/// Names are trimmed and unescaped. Folder names are not unique: two
/// folders under different parents may share one, and the selector does not
/// show the parent.
pub fn parse_folder_list(html: &str) -> Result<Vec<ParsedFolder>, ParseError> {
    let mut folders: Vec<ParsedFolder> = Vec::new();
    for select in elements_with_attr(html, "select", "name", "folder") {
        for option in elements(&select.inner_html, "option") {
            let value = option.attr("value").unwrap_or_default();
            if value.trim().is_empty() {
                continue;
            }
            let id = leading_number(value)
                .ok_or_else(|| ParseError::invalid("folder id", value, "upload_file"))?;
            if folders.iter().all(|f| f.id != id) {
                folders.push(ParsedFolder {
                    id,
                    name: option.text(),
                });
            }
        }
    }
    Ok(folders)
}

/// Find the id of the first folder named `folder_name` in any folder selector
pub fn parse_folder_number(html: &str, folder_name: &str) -> Result<Option<u64>, ParseError> {
    Ok(parse_folder_list(html)?
        .into_iter()
        .find(|f| f.name == folder_name)
        .map(|f| f.id))
}

/// The hidden one-time `uploadformbuild` token of the upload form
pub fn parse_upload_form_build_token(html: &str) -> Option<String> {
    elements_with_attr(html, "input", "name", "uploadformbuild")
        .into_iter()
        .find_map(|input| input.attr("value").map(str::to_string))
}

/// The new upload id from the page returned after posting a file
pub fn parse_new_upload_number(html: &str) -> Option<u64> {
    elements(html, "a")
        .iter()
        .filter_map(|a| a.attr("href"))
        .find(|href| href.contains("upload="))
        .and_then(|href| query_number(href, "upload="))
}

/// All licenses offered by the bulk-license selector of `view-license`
///
/// A page without the selector yields an empty list.
pub fn parse_all_license_data(html: &str) -> Vec<ParsedLicense> {
    let Some(select) = elements_with_attr(html, "select", "id", "bulkLicense")
        .into_iter()
        .next()
    else {
        return Vec::new();
    };

    elements(&select.inner_html, "option")
        .into_iter()
        .filter_map(|option| {
            let id = leading_number(option.attr("value")?)?;
            Some(ParsedLicense {
                name: option.text(),
                id,
            })
        })
        .collect()
}

fn parse_upload_line_item(item: &Value) -> Result<ParsedUpload, ParseError> {
    const PAGE: &str = "browse-processPost";

    let cells = item
        .as_array()
        .ok_or_else(|| ParseError::invalid("upload row", item.to_string(), PAGE))?;
    let markup = cells
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| ParseError::missing("upload markup cell", PAGE))?;

    let name = elements(markup, "b")
        .first()
        .map(|b| strip_tags(&b.inner_html))
        .ok_or_else(|| ParseError::missing("upload name", PAGE))?;

    let top_tree_item_id = elements(markup, "a")
        .first()
        .and_then(|a| a.attr("href"))
        .and_then(|href| query_number(href, "item="));

    let option_value = |title: &str| {
        elements_with_attr(markup, "option", "title", title)
            .first()
            .and_then(|o| o.attr("value"))
            .map(str::to_string)
    };

    let id_value = cells
        .get(2)
        .and_then(|c| c.get(0))
        .ok_or_else(|| ParseError::missing("upload id cell", PAGE))?;
    let id = match id_value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => leading_number(s),
        _ => None,
    }
    .ok_or_else(|| ParseError::invalid("upload id", id_value.to_string(), PAGE))?;

    Ok(ParsedUpload {
        name,
        id,
        top_tree_item_id,
        spdx_xml_url: option_value("Generate SPDX report"),
        spdx_tv_url: option_value("Generate SPDX report in tag:value format"),
    })
}

/// Parse the `aaData` rows returned by `browse-processPost`
pub fn parse_upload_list(body: &str) -> Result<Vec<ParsedUpload>, ParseError> {
    let json: Value = serde_json::from_str(body).map_err(|e| ParseError::Json {
        page: "browse-processPost".to_string(),
        source: e,
    })?;
    let rows = json
        .get("aaData")
        .and_then(Value::as_array)
        .ok_or_else(|| ParseError::missing("aaData", "browse-processPost"))?;
    rows.iter().map(parse_upload_line_item).collect()
}

const SUMMARY_LABELS: [(usize, &str); 8] = [
    (0, "Unique licenses"),
    (3, "Files"),
    (4, "Unique scanner detected licenses"),
    (7, "Unique concluded licenses"),
    (8, "Licenses found"),
    (11, "Licenses concluded"),
    (12, "Files with no detected licenses"),
    (15, "Concluded files with no detected licenses"),
];

/// Parse the `#licsummary` table of the license browser
///
/// The table holds two counters per row, each beside its label:
/// `label | value | value | label`.
pub fn parse_license_summary(html: &str) -> Result<LicenseSummary, ParseError> {
    const PAGE: &str = "license";

    let table = element_by_id(html, "licsummary")
        .ok_or_else(|| ParseError::missing("#licsummary table", PAGE))?;
    let cells: Vec<String> = elements(&table.inner_html, "td")
        .iter()
        .map(|td| td.text())
        .collect();

    if cells.len() < 16 {
        return Err(ParseError::missing("16 summary cells", PAGE));
    }
    for (index, label) in SUMMARY_LABELS {
        if cells[index] != label {
            return Err(ParseError::invalid("summary label", cells[index].as_str(), PAGE));
        }
    }

    let value = |index: usize| -> Result<u64, ParseError> {
        cells[index]
            .replace(',', "")
            .parse()
            .map_err(|_| ParseError::invalid("summary count", cells[index].as_str(), PAGE))
    };

    Ok(LicenseSummary {
        unique_licenses: value(1)?,
        files: value(2)?,
        unique_scanner_detected_licenses: value(5)?,
        unique_concluded_licenses: value(6)?,
        licenses_found: value(9)?,
        licenses_concluded: value(10)?,
        files_with_no_detected_licenses: value(13)?,
        concluded_files_with_no_detected_licenses: value(14)?,
    })
}
