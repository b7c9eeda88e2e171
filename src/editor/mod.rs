//! Session controller: click-to-edit, live preview, save/cancel,
//! fix-on-demand, and undo/redo replay over one theme document.

use thiserror::Error;

use crate::color::{ColorError, Rgb};
use crate::contrast;
use crate::history::{EditHistory, EditRecord};
use crate::state::{EditEvent, EditState, EditStateMachine, StateError};
use crate::theme::{ThemeDocument, ThemeError, VariantName};

/// Minimum ratio treated as good contrast for non-text UI elements.
pub const GOOD_CONTRAST_RATIO: f64 = 3.0;

pub type EditorResult<T> = std::result::Result<T, EditorError>;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Color(#[from] ColorError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Theme(#[from] ThemeError),
}

/// Commands the host input layer dispatches into the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorCommand {
    BeginEdit { role: String },
    PreviewColor { value: String },
    Save,
    Cancel,
    FixContrast { role: String },
    Undo,
    Redo,
    SelectVariant { variant: VariantName },
}

/// What a dispatched command did. History underflow and an already
/// compliant fix target are outcomes, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    EditStarted {
        role: String,
    },
    PreviewApplied {
        role: String,
        value: String,
    },
    Saved {
        role: String,
        value: String,
        recorded: bool,
    },
    Cancelled {
        role: String,
    },
    ContrastFixed {
        role: String,
        value: String,
        converged: bool,
    },
    ContrastUnchanged {
        role: String,
    },
    UndoApplied {
        record: EditRecord,
    },
    RedoApplied {
        record: EditRecord,
    },
    NothingToUndo,
    NothingToRedo,
    VariantSelected {
        variant: VariantName,
    },
}

/// Per-role display data derived for each palette render.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleDisplay {
    pub role: String,
    pub value: String,
    pub contrast_ratio: f64,
    pub good_contrast: bool,
    pub editing: bool,
}

type Subscriber = Box<dyn FnMut(&[RoleDisplay])>;

/// Orchestrates one editing session. Owns the theme document and the edit
/// history exclusively; everything is synchronous and bounded.
pub struct PaletteController {
    document: ThemeDocument,
    history: EditHistory,
    machine: EditStateMachine,
    variant: VariantName,
    background: Rgb,
    min_contrast_ratio: f64,
    subscribers: Vec<Subscriber>,
}

impl PaletteController {
    /// `background` is the ambient app background contrast is judged
    /// against. A disabled `variant` is redirected through the enablement
    /// flags.
    pub fn new(document: ThemeDocument, variant: VariantName, background: Rgb) -> Self {
        let variant = document.flags().first_enabled(variant);
        Self {
            document,
            history: EditHistory::new(),
            machine: EditStateMachine::new(),
            variant,
            background,
            min_contrast_ratio: GOOD_CONTRAST_RATIO,
            subscribers: Vec::new(),
        }
    }

    pub fn with_min_contrast_ratio(mut self, min_ratio: f64) -> Self {
        self.min_contrast_ratio = min_ratio;
        self
    }

    pub fn document(&self) -> &ThemeDocument {
        &self.document
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn state(&self) -> &EditState {
        self.machine.state()
    }

    pub fn variant(&self) -> VariantName {
        self.variant
    }

    /// Register a listener called with a fresh display snapshot after
    /// every mutation of the document.
    pub fn subscribe(&mut self, listener: impl FnMut(&[RoleDisplay]) + 'static) {
        self.subscribers.push(Box::new(listener));
    }

    pub fn dispatch(&mut self, command: EditorCommand) -> EditorResult<EditorEvent> {
        match command {
            EditorCommand::BeginEdit { role } => self.begin_edit(role),
            EditorCommand::PreviewColor { value } => self.preview_color(value),
            EditorCommand::Save => self.save(),
            EditorCommand::Cancel => self.cancel(),
            EditorCommand::FixContrast { role } => self.fix_contrast(role),
            EditorCommand::Undo => self.undo(),
            EditorCommand::Redo => self.redo(),
            EditorCommand::SelectVariant { variant } => self.select_variant(variant),
        }
    }

    /// Derived rows for the current variant, in schema order.
    pub fn display(&self) -> Vec<RoleDisplay> {
        let palette = self.document.resolve(self.variant);
        let editing_role = self.machine.state().editing_role();
        self.document
            .schema()
            .roles()
            .iter()
            .map(|role| {
                let value = palette
                    .get(role)
                    .expect("validated palettes contain every schema role")
                    .clone();
                let rgb = Rgb::parse(&value).expect("palette values are validated hex");
                let ratio = contrast::contrast_ratio(rgb, self.background);
                RoleDisplay {
                    role: role.clone(),
                    value,
                    contrast_ratio: ratio,
                    good_contrast: ratio >= self.min_contrast_ratio,
                    editing: editing_role == Some(role.as_str()),
                }
            })
            .collect()
    }

    fn begin_edit(&mut self, role: String) -> EditorResult<EditorEvent> {
        self.cancel_pending_edit()?;

        let original_value = match self.document.color(self.variant, &role) {
            Some(value) => value.to_string(),
            None => {
                return Err(ThemeError::UnknownRole {
                    variant: self.variant,
                    role,
                }
                .into())
            }
        };

        self.machine.transition(EditEvent::BeginEdit {
            role: role.clone(),
            original_value,
        })?;
        self.notify();
        Ok(EditorEvent::EditStarted { role })
    }

    fn preview_color(&mut self, value: String) -> EditorResult<EditorEvent> {
        // Invalid input never reaches the machine or the store; the prior
        // committed value stays intact and save remains blocked upstream.
        Rgb::parse(&value)?;

        self.machine.transition(EditEvent::Preview {
            value: value.clone(),
        })?;
        let role = self
            .machine
            .state()
            .editing_role()
            .expect("previewing state always carries a role")
            .to_string();
        self.document.set_color(self.variant, &role, &value)?;
        self.notify();
        Ok(EditorEvent::PreviewApplied { role, value })
    }

    fn save(&mut self) -> EditorResult<EditorEvent> {
        let state = self.machine.state().clone();
        self.machine.transition(EditEvent::Save)?;
        match state {
            EditState::LivePreviewing {
                role,
                original_value,
                temp_value,
            } => {
                let recorded = temp_value != original_value;
                if recorded {
                    self.history.record(
                        role.as_str(),
                        self.variant,
                        original_value.as_str(),
                        temp_value.as_str(),
                    );
                    // Re-apply the committed value for consistency.
                    self.document.set_color(self.variant, &role, &temp_value)?;
                }
                self.notify();
                Ok(EditorEvent::Saved {
                    role,
                    value: temp_value,
                    recorded,
                })
            }
            EditState::Editing {
                role,
                original_value,
            } => {
                self.notify();
                Ok(EditorEvent::Saved {
                    role,
                    value: original_value,
                    recorded: false,
                })
            }
            EditState::Idle => unreachable!("the transition above rejects save while idle"),
        }
    }

    fn cancel(&mut self) -> EditorResult<EditorEvent> {
        let state = self.machine.state().clone();
        self.machine.transition(EditEvent::Cancel)?;
        match state {
            EditState::LivePreviewing {
                role,
                original_value,
                ..
            } => {
                self.document
                    .set_color(self.variant, &role, &original_value)?;
                self.notify();
                Ok(EditorEvent::Cancelled { role })
            }
            EditState::Editing { role, .. } => {
                self.notify();
                Ok(EditorEvent::Cancelled { role })
            }
            EditState::Idle => unreachable!("the transition above rejects cancel while idle"),
        }
    }

    fn fix_contrast(&mut self, role: String) -> EditorResult<EditorEvent> {
        self.cancel_pending_edit()?;

        let current = match self.document.color(self.variant, &role) {
            Some(value) => value.to_string(),
            None => {
                return Err(ThemeError::UnknownRole {
                    variant: self.variant,
                    role,
                }
                .into())
            }
        };

        let rgb = Rgb::parse(&current)?;
        let outcome = contrast::fix_color(rgb, self.background, self.min_contrast_ratio);
        if outcome.color == rgb {
            return Ok(EditorEvent::ContrastUnchanged { role });
        }

        // A fix commits directly, bypassing the edit/save flow.
        let fixed = outcome.color.to_hex();
        self.history
            .record(role.as_str(), self.variant, current.as_str(), fixed.as_str());
        self.document.set_color(self.variant, &role, &fixed)?;
        self.notify();
        Ok(EditorEvent::ContrastFixed {
            role,
            value: fixed,
            converged: outcome.converged,
        })
    }

    fn undo(&mut self) -> EditorResult<EditorEvent> {
        self.cancel_pending_edit()?;
        match self.history.undo() {
            Some(record) => {
                self.document
                    .set_color(record.variant, &record.role, &record.old_value)?;
                self.notify();
                Ok(EditorEvent::UndoApplied { record })
            }
            None => Ok(EditorEvent::NothingToUndo),
        }
    }

    fn redo(&mut self) -> EditorResult<EditorEvent> {
        self.cancel_pending_edit()?;
        match self.history.redo() {
            Some(record) => {
                self.document
                    .set_color(record.variant, &record.role, &record.new_value)?;
                self.notify();
                Ok(EditorEvent::RedoApplied { record })
            }
            None => Ok(EditorEvent::NothingToRedo),
        }
    }

    fn select_variant(&mut self, variant: VariantName) -> EditorResult<EditorEvent> {
        self.cancel_pending_edit()?;
        let selected = self.document.flags().first_enabled(variant);
        if selected != variant {
            tracing::debug!(
                requested = %variant,
                selected = %selected,
                "requested variant disabled; selecting first enabled"
            );
        }
        self.variant = selected;
        self.notify();
        Ok(EditorEvent::VariantSelected { variant: selected })
    }

    /// Undo/redo, fix, and variant switches received mid-edit cancel the
    /// in-progress edit first, then apply. This ordering is deliberate and
    /// deterministic.
    fn cancel_pending_edit(&mut self) -> EditorResult<()> {
        let state = self.machine.state().clone();
        match state {
            EditState::Idle => Ok(()),
            EditState::Editing { role, .. } => {
                tracing::debug!(%role, "implicitly cancelling in-progress edit");
                self.machine.transition(EditEvent::Cancel)?;
                Ok(())
            }
            EditState::LivePreviewing {
                role,
                original_value,
                ..
            } => {
                tracing::debug!(%role, "implicitly cancelling in-progress edit");
                self.machine.transition(EditEvent::Cancel)?;
                self.document
                    .set_color(self.variant, &role, &original_value)?;
                Ok(())
            }
        }
    }

    fn notify(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }
        let rows = self.display();
        for subscriber in &mut self.subscribers {
            subscriber(&rows);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::{ColorPalette, RoleSchema, ThemeConfig, ThemeSettings, VariantColors, VariantFlags};
    use std::cell::RefCell;
    use std::rc::Rc;

    const WHITE: Rgb = Rgb::new(255, 255, 255);

    fn palette(pairs: &[(&str, &str)]) -> ColorPalette {
        pairs
            .iter()
            .map(|(role, value)| (role.to_string(), value.to_string()))
            .collect()
    }

    fn test_document() -> ThemeDocument {
        let config = ThemeConfig {
            colors: VariantColors {
                light: palette(&[("primary", "#2196F3"), ("onSurface", "#1C1B1F")]),
                light_medium_contrast: None,
                light_high_contrast: None,
                dark: palette(&[("primary", "#90CAF9"), ("onSurface", "#E6E1E5")]),
                dark_medium_contrast: None,
                dark_high_contrast: None,
            },
            settings: None,
        };
        ThemeDocument::from_config(config, RoleSchema::new(["primary", "onSurface"]))
            .expect("test config should validate")
    }

    fn light_controller() -> PaletteController {
        PaletteController::new(test_document(), VariantName::Light, WHITE)
    }

    fn begin(controller: &mut PaletteController, role: &str) {
        controller
            .dispatch(EditorCommand::BeginEdit {
                role: role.to_string(),
            })
            .expect("begin edit should work");
    }

    fn preview(controller: &mut PaletteController, value: &str) {
        controller
            .dispatch(EditorCommand::PreviewColor {
                value: value.to_string(),
            })
            .expect("preview should work");
    }

    #[test]
    fn live_edit_cancel_then_save_scenario() {
        let mut controller = light_controller();

        // Live edit applies to the store immediately, with no history.
        begin(&mut controller, "primary");
        preview(&mut controller, "#FF0000");
        assert_eq!(
            controller.document().color(VariantName::Light, "primary"),
            Some("#FF0000")
        );
        assert_eq!(controller.history().len(), 0);

        // Cancel reverts the preview and still records nothing.
        let event = controller
            .dispatch(EditorCommand::Cancel)
            .expect("cancel should work");
        assert_eq!(
            event,
            EditorEvent::Cancelled {
                role: "primary".to_string()
            }
        );
        assert_eq!(
            controller.document().color(VariantName::Light, "primary"),
            Some("#2196F3")
        );
        assert_eq!(controller.history().len(), 0);

        // Edit again and save: exactly one record with the right shape.
        begin(&mut controller, "primary");
        preview(&mut controller, "#00FF00");
        let event = controller
            .dispatch(EditorCommand::Save)
            .expect("save should work");
        assert_eq!(
            event,
            EditorEvent::Saved {
                role: "primary".to_string(),
                value: "#00FF00".to_string(),
                recorded: true,
            }
        );
        assert_eq!(controller.history().len(), 1);

        let record = &controller.history().entries()[0];
        assert_eq!(record.role, "primary");
        assert_eq!(record.variant, VariantName::Light);
        assert_eq!(record.old_value, "#2196F3");
        assert_eq!(record.new_value, "#00FF00");
        assert!(controller.state().is_idle());
    }

    #[test]
    fn save_without_changes_records_nothing() {
        let mut controller = light_controller();
        begin(&mut controller, "primary");
        preview(&mut controller, "#2196F3");

        let event = controller
            .dispatch(EditorCommand::Save)
            .expect("save should work");
        assert_eq!(
            event,
            EditorEvent::Saved {
                role: "primary".to_string(),
                value: "#2196F3".to_string(),
                recorded: false,
            }
        );
        assert_eq!(controller.history().len(), 0);
    }

    #[test]
    fn invalid_preview_is_rejected_without_touching_state() {
        let mut controller = light_controller();
        begin(&mut controller, "primary");

        let err = controller
            .dispatch(EditorCommand::PreviewColor {
                value: "not-a-color".to_string(),
            })
            .expect_err("invalid hex should be rejected");
        assert!(matches!(err, EditorError::Color(_)));

        // Still editing; the store kept the committed value.
        assert_eq!(controller.state().editing_role(), Some("primary"));
        assert_eq!(
            controller.document().color(VariantName::Light, "primary"),
            Some("#2196F3")
        );

        // A valid preview and save still go through afterwards.
        preview(&mut controller, "#00FF00");
        controller
            .dispatch(EditorCommand::Save)
            .expect("save should work");
        assert_eq!(controller.history().len(), 1);
    }

    #[test]
    fn undo_redo_round_trip_restores_store_values() {
        let mut controller = light_controller();
        let values = ["#111111", "#222222", "#333333"];
        for value in values {
            begin(&mut controller, "primary");
            preview(&mut controller, value);
            controller
                .dispatch(EditorCommand::Save)
                .expect("save should work");
        }
        assert_eq!(controller.history().len(), 3);

        // Undo all the way back to the loaded value.
        for expected in ["#222222", "#111111", "#2196F3"] {
            let event = controller
                .dispatch(EditorCommand::Undo)
                .expect("undo should work");
            assert!(matches!(event, EditorEvent::UndoApplied { .. }));
            assert_eq!(
                controller.document().color(VariantName::Light, "primary"),
                Some(expected)
            );
        }
        assert_eq!(
            controller
                .dispatch(EditorCommand::Undo)
                .expect("exhausted undo should be a no-op"),
            EditorEvent::NothingToUndo
        );

        // Redo all the way forward again.
        for expected in values {
            let event = controller
                .dispatch(EditorCommand::Redo)
                .expect("redo should work");
            assert!(matches!(event, EditorEvent::RedoApplied { .. }));
            assert_eq!(
                controller.document().color(VariantName::Light, "primary"),
                Some(expected)
            );
        }
        assert_eq!(
            controller
                .dispatch(EditorCommand::Redo)
                .expect("exhausted redo should be a no-op"),
            EditorEvent::NothingToRedo
        );
    }

    #[test]
    fn undo_during_live_preview_cancels_the_edit_first() {
        let mut controller = light_controller();
        begin(&mut controller, "primary");
        preview(&mut controller, "#111111");
        controller
            .dispatch(EditorCommand::Save)
            .expect("save should work");

        // Start another edit and leave it hanging mid-preview.
        begin(&mut controller, "onSurface");
        preview(&mut controller, "#ABCDEF");

        let event = controller
            .dispatch(EditorCommand::Undo)
            .expect("undo should work");
        assert!(matches!(event, EditorEvent::UndoApplied { .. }));

        // The pending preview was reverted, not committed.
        assert!(controller.state().is_idle());
        assert_eq!(
            controller.document().color(VariantName::Light, "onSurface"),
            Some("#1C1B1F")
        );
        // And the undo applied to the saved edit.
        assert_eq!(
            controller.document().color(VariantName::Light, "primary"),
            Some("#2196F3")
        );
        assert_eq!(controller.history().len(), 1);
    }

    #[test]
    fn fix_contrast_commits_directly_through_history() {
        let mut controller = light_controller();
        let before = controller
            .document()
            .color(VariantName::Light, "primary")
            .expect("role should exist")
            .to_string();

        let event = controller
            .dispatch(EditorCommand::FixContrast {
                role: "primary".to_string(),
            })
            .expect("fix should work");

        let fixed = match event {
            EditorEvent::ContrastFixed {
                value, converged, ..
            } => {
                assert!(converged);
                value
            }
            other => panic!("expected a contrast fix, got {other:?}"),
        };

        let rgb = Rgb::parse(&fixed).expect("fixed value should be valid hex");
        assert!(contrast::contrast_ratio(rgb, WHITE) >= GOOD_CONTRAST_RATIO);
        assert_eq!(controller.history().len(), 1);
        assert_eq!(controller.history().entries()[0].old_value, before);
        assert_eq!(controller.history().entries()[0].new_value, fixed);
        assert_eq!(
            controller.document().color(VariantName::Light, "primary"),
            Some(fixed.as_str())
        );

        // Fixing again is a no-op: the color is already compliant.
        let event = controller
            .dispatch(EditorCommand::FixContrast {
                role: "primary".to_string(),
            })
            .expect("second fix should work");
        assert_eq!(
            event,
            EditorEvent::ContrastUnchanged {
                role: "primary".to_string()
            }
        );
        assert_eq!(controller.history().len(), 1);
    }

    #[test]
    fn commit_after_undo_makes_redo_unreachable() {
        let mut controller = light_controller();
        for value in ["#111111", "#222222"] {
            begin(&mut controller, "primary");
            preview(&mut controller, value);
            controller
                .dispatch(EditorCommand::Save)
                .expect("save should work");
        }

        controller
            .dispatch(EditorCommand::Undo)
            .expect("undo should work");

        begin(&mut controller, "primary");
        preview(&mut controller, "#333333");
        controller
            .dispatch(EditorCommand::Save)
            .expect("save should work");

        assert_eq!(
            controller
                .dispatch(EditorCommand::Redo)
                .expect("redo should be a no-op"),
            EditorEvent::NothingToRedo
        );
    }

    #[test]
    fn display_flags_poor_contrast_and_editing_role() {
        let mut controller = light_controller();
        begin(&mut controller, "primary");

        let rows = controller.display();
        assert_eq!(rows.len(), 2);

        let primary = rows
            .iter()
            .find(|row| row.role == "primary")
            .expect("primary row should exist");
        assert!(primary.editing);
        // Material blue on white misses the 3.0 bar.
        assert!(!primary.good_contrast);

        let on_surface = rows
            .iter()
            .find(|row| row.role == "onSurface")
            .expect("onSurface row should exist");
        assert!(!on_surface.editing);
        assert!(on_surface.good_contrast);
    }

    #[test]
    fn subscribers_receive_snapshots_after_mutations() {
        let mut controller = light_controller();
        let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&seen);
        controller.subscribe(move |rows| {
            let primary = rows
                .iter()
                .find(|row| row.role == "primary")
                .expect("snapshot should include primary");
            sink.borrow_mut().push(primary.value.clone());
        });

        begin(&mut controller, "primary");
        preview(&mut controller, "#FF0000");
        controller
            .dispatch(EditorCommand::Save)
            .expect("save should work");

        let values = seen.borrow();
        // begin, preview, save each pushed a snapshot.
        assert_eq!(values.len(), 3);
        assert_eq!(values[1], "#FF0000");
        assert_eq!(values[2], "#FF0000");
    }

    #[test]
    fn select_variant_respects_enablement_flags() {
        let mut document = test_document();
        document.set_flags(VariantFlags {
            light_mode: true,
            light_medium: false,
            light_high: false,
            dark_mode: false,
            dark_medium: false,
            dark_high: false,
        });
        let mut controller = PaletteController::new(document, VariantName::Light, WHITE);

        let event = controller
            .dispatch(EditorCommand::SelectVariant {
                variant: VariantName::Dark,
            })
            .expect("select should work");
        assert_eq!(
            event,
            EditorEvent::VariantSelected {
                variant: VariantName::Light
            }
        );
        assert_eq!(controller.variant(), VariantName::Light);
    }

    #[test]
    fn disabled_preferred_variant_is_redirected_at_construction() {
        let mut document = test_document();
        document.set_flags(VariantFlags {
            light_mode: false,
            light_medium: false,
            light_high: false,
            dark_mode: true,
            dark_medium: false,
            dark_high: false,
        });
        let controller = PaletteController::new(document, VariantName::Light, WHITE);
        assert_eq!(controller.variant(), VariantName::Dark);
    }

    #[test]
    fn begin_edit_rejects_unknown_role() {
        let mut controller = light_controller();
        let err = controller
            .dispatch(EditorCommand::BeginEdit {
                role: "outline".to_string(),
            })
            .expect_err("unknown role should be rejected");
        assert!(matches!(
            err,
            EditorError::Theme(ThemeError::UnknownRole { .. })
        ));
        assert!(controller.state().is_idle());
    }

    #[test]
    fn edits_in_dark_variant_never_touch_light() {
        let mut controller = light_controller();
        controller
            .dispatch(EditorCommand::SelectVariant {
                variant: VariantName::Dark,
            })
            .expect("select should work");

        begin(&mut controller, "primary");
        preview(&mut controller, "#FF0000");
        controller
            .dispatch(EditorCommand::Save)
            .expect("save should work");

        assert_eq!(
            controller.document().color(VariantName::Dark, "primary"),
            Some("#FF0000")
        );
        assert_eq!(
            controller.document().color(VariantName::Light, "primary"),
            Some("#2196F3")
        );
    }

    #[test]
    fn settings_flags_survive_document_construction() {
        let config = ThemeConfig {
            colors: VariantColors {
                light: palette(&[("primary", "#2196F3"), ("onSurface", "#1C1B1F")]),
                light_medium_contrast: None,
                light_high_contrast: None,
                dark: palette(&[("primary", "#90CAF9"), ("onSurface", "#E6E1E5")]),
                dark_medium_contrast: None,
                dark_high_contrast: None,
            },
            settings: Some(ThemeSettings {
                theme_variants: VariantFlags {
                    light_mode: false,
                    light_medium: false,
                    light_high: false,
                    dark_mode: true,
                    dark_medium: false,
                    dark_high: false,
                },
            }),
        };
        let document =
            ThemeDocument::from_config(config, RoleSchema::new(["primary", "onSurface"]))
                .expect("config should validate");

        let controller = PaletteController::new(document, VariantName::Light, WHITE);
        assert_eq!(controller.variant(), VariantName::Dark);
    }
}
