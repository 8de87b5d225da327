//! Export readiness diagnostics for annotation documents.
//!
//! Reports gaps that should be filled before a journey is handed off,
//! without modifying the document or blocking the export.

use crate::id::ElementId;
use crate::model::AnnotationData;
use std::collections::HashSet;

// ─── Diagnostic types ────────────────────────────────────────────────────

/// Severity of a lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintSeverity {
    /// Should be fixed before export.
    Warning,
    /// Informational.
    Info,
}

/// A single readiness diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintDiagnostic {
    /// The element this refers to, if any.
    pub element: Option<ElementId>,
    /// Human-readable message.
    pub message: String,
    pub severity: LintSeverity,
    /// Short rule identifier (e.g. "project-id", "dangling-endpoint").
    pub rule: &'static str,
}

// ─── Public API ───────────────────────────────────────────────────────────

/// Run all readiness rules over the document.
#[must_use]
pub fn lint_document(data: &AnnotationData) -> Vec<LintDiagnostic> {
    let mut diags = Vec::new();
    lint_project_id(data, &mut diags);
    lint_journey_reflection(data, &mut diags);
    lint_dangling_endpoints(data, &mut diags);
    lint_unlabeled_nodes(data, &mut diags);
    diags
}

// ─── Rules ────────────────────────────────────────────────────────────────

fn lint_project_id(data: &AnnotationData, diags: &mut Vec<LintDiagnostic>) {
    let id = &data.project_id;
    let fields = [
        ("building ID", &id.building_id),
        ("architect ID", &id.architect_id),
        ("route ID", &id.route_id),
    ];
    for (name, value) in fields {
        if value.trim().is_empty() {
            diags.push(LintDiagnostic {
                element: None,
                message: format!("Project {name} is blank; the export will use a generic file name."),
                severity: LintSeverity::Warning,
                rule: "project-id",
            });
        }
    }
}

fn lint_journey_reflection(data: &AnnotationData, diags: &mut Vec<LintDiagnostic>) {
    let Some(reflection) = &data.journey_reflection else {
        diags.push(LintDiagnostic {
            element: None,
            message: "Journey reflection has not been filled in.".to_string(),
            severity: LintSeverity::Warning,
            rule: "journey-reflection",
        });
        return;
    };
    let ratings = [
        ("confidence", reflection.confidence),
        ("adherence expectation", reflection.adherence_expectation),
        ("team alignment", reflection.team_alignment),
    ];
    for (name, value) in ratings {
        if !(1..=5).contains(&value) {
            diags.push(LintDiagnostic {
                element: None,
                message: format!("Journey reflection {name} must be rated 1–5, got {value}."),
                severity: LintSeverity::Warning,
                rule: "journey-reflection",
            });
        }
    }
}

/// Corridor endpoints must name existing nodes.
fn lint_dangling_endpoints(data: &AnnotationData, diags: &mut Vec<LintDiagnostic>) {
    let nodes: HashSet<ElementId> = data.nodes.iter().map(|n| n.id).collect();
    for corridor in &data.corridors {
        for endpoint in [corridor.from, corridor.to].into_iter().flatten() {
            if !nodes.contains(&endpoint) {
                diags.push(LintDiagnostic {
                    element: Some(corridor.id),
                    message: format!(
                        "Corridor `{}` references missing node `{endpoint}`.",
                        corridor.id
                    ),
                    severity: LintSeverity::Warning,
                    rule: "dangling-endpoint",
                });
            }
        }
    }
}

fn lint_unlabeled_nodes(data: &AnnotationData, diags: &mut Vec<LintDiagnostic>) {
    for node in &data.nodes {
        if node.space_annotation.label.trim().is_empty() {
            diags.push(LintDiagnostic {
                element: Some(node.id),
                message: format!("{} `{}` has no label.", node.node_type.label(), node.id),
                severity: LintSeverity::Info,
                rule: "unlabeled-node",
            });
        }
    }
}
