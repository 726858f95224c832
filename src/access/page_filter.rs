// Role-based content filtering for CMS page JSON
use serde_json::{json, Map, Value};

use super::{has_access, minimum_required_role, Role};

const DEFAULT_UPGRADE_MESSAGE: &str = "Upgrade your plan to unlock this content";
const DEFAULT_REDIRECT_PATH: &str = "/pricing";
const DEFAULT_REDIRECT_MESSAGE: &str = "View plans";

/// Filter a page document for a viewer role.
///
/// Admin and SuperAdmin see the page unchanged. For everyone else the
/// `sections` map is walked recursively (including nested `components`
/// lists): granted nodes pass whole with `is_locked: false`, denied nodes
/// are hidden, reduced to a locked stub, or reduced to a teaser depending
/// on their `restriction_type`. Running the filter twice for the same role
/// yields the same output, and denied nodes never retain content fields.
pub fn filter_page_by_role(page: &Value, role: Option<Role>) -> Value {
    if matches!(role, Some(r) if r.is_admin()) {
        return page.clone();
    }

    let mut filtered = page.clone();
    if let Some(sections) = page.get("sections").and_then(Value::as_object) {
        let mut kept = Map::new();
        for (key, node) in sections {
            if let Some(filtered_node) = filter_node(node, role) {
                kept.insert(key.clone(), filtered_node);
            }
        }
        filtered["sections"] = Value::Object(kept);
    }
    filtered
}

/// Returns `None` when the node must be dropped (`restriction_type: hidden`).
fn filter_node(node: &Value, role: Option<Role>) -> Option<Value> {
    let obj = match node.as_object() {
        Some(obj) => obj,
        None => return Some(node.clone()),
    };

    // Already-filtered stubs pass through untouched; this is what makes the
    // filter idempotent.
    if obj.get("is_locked").and_then(Value::as_bool) == Some(true) {
        return Some(node.clone());
    }

    // Nodes without explicit access metadata default to ProUser-only, full lock.
    let has_metadata = obj.contains_key("allowed_roles") || obj.contains_key("restriction_type");
    let allowed_roles: Vec<String> = if has_metadata {
        obj.get("allowed_roles")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default()
    } else {
        vec![Role::ProUser.as_str().to_string()]
    };
    let restriction_type = if has_metadata {
        obj.get("restriction_type").and_then(Value::as_str).unwrap_or("full")
    } else {
        "full"
    };

    let granted = has_access(role, &allowed_roles);

    if granted || restriction_type == "none" {
        let mut out = node.clone();
        out["is_locked"] = json!(false);
        if let Some(components) = obj.get("components").and_then(Value::as_array) {
            let kept: Vec<Value> = components
                .iter()
                .filter_map(|c| filter_node(c, role))
                .collect();
            out["components"] = Value::Array(kept);
        }
        return Some(out);
    }

    match restriction_type {
        "hidden" => None,
        "partial" => Some(locked_stub(obj, &allowed_roles, restriction_type, true)),
        _ => Some(locked_stub(obj, &allowed_roles, restriction_type, false)),
    }
}

/// Replacement node for denied content. Carries only presentation hints for
/// the upgrade prompt, never the original content fields.
fn locked_stub(
    obj: &Map<String, Value>,
    allowed_roles: &[String],
    restriction_type: &str,
    keep_description: bool,
) -> Value {
    let mut stub = Map::new();
    stub.insert("is_locked".to_string(), json!(true));
    stub.insert("restriction_type".to_string(), json!(restriction_type));
    stub.insert(
        "upgrade_message".to_string(),
        obj.get("upgrade_message").cloned().unwrap_or_else(|| json!(DEFAULT_UPGRADE_MESSAGE)),
    );
    stub.insert(
        "required_role".to_string(),
        json!(minimum_required_role(allowed_roles).as_str()),
    );
    stub.insert(
        "redirect_path".to_string(),
        obj.get("redirect_path").cloned().unwrap_or_else(|| json!(DEFAULT_REDIRECT_PATH)),
    );
    stub.insert(
        "redirect_message".to_string(),
        obj.get("redirect_message").cloned().unwrap_or_else(|| json!(DEFAULT_REDIRECT_MESSAGE)),
    );
    if let Some(title) = obj.get("title") {
        stub.insert("title".to_string(), title.clone());
    }
    if keep_description {
        if let Some(description) = obj.get("description") {
            stub.insert("description".to_string(), description.clone());
        }
    }
    Value::Object(stub)
}
