use chrono::Utc;
use egui::{Color32, RichText, Ui};
use egui_phosphor::regular as icons;
use uuid::Uuid;

use crate::app::{TimelineApp, TodoEdit};
use crate::model::TodoFilter;
use crate::ui::theme;

/// One user action collected while the list is drawn, applied afterwards.
#[derive(Debug, Clone)]
enum TodoAction {
    Toggle(Uuid),
    ToggleExpanded(Uuid),
    Delete(Uuid),
    ToggleSubtask(Uuid, Uuid),
    DeleteSubtask(Uuid, Uuid),
    AddSubtask(Uuid),
    BeginEdit(TodoEdit),
    CommitEdit,
    CancelEdit,
}

/// Render the daily todo list.
pub fn show_todo_panel(app: &mut TimelineApp, ui: &mut Ui) {
    let mut actions = Vec::new();

    egui::Frame::default()
        .inner_margin(egui::Margin::symmetric(16.0, 12.0))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                let resp = ui.add_sized(
                    [ui.available_width() - 90.0, 26.0],
                    egui::TextEdit::singleline(&mut app.new_todo_text).hint_text("Add a todo..."),
                );
                let submitted = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.add_sized([80.0, 26.0], egui::Button::new(format!("{} Add", icons::PLUS))).clicked()
                    || submitted
                {
                    app.add_todo();
                    resp.request_focus();
                }
            });

            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.selectable_value(&mut app.todo_filter, TodoFilter::Active, "Active");
                ui.selectable_value(&mut app.todo_filter, TodoFilter::Completed, "Completed");
                ui.selectable_value(&mut app.todo_filter, TodoFilter::All, "All");

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button(format!("{} History", icons::CLOCK_COUNTER_CLOCKWISE)).clicked() {
                        app.show_history = true;
                    }
                    let new_day = ui
                        .button(format!("{} New Day", icons::SUN))
                        .on_hover_text("Archive every current todo and start fresh");
                    if new_day.clicked() && !app.todos.todos.is_empty() {
                        app.start_new_day();
                    }
                });
            });
            ui.separator();

            let items: Vec<_> = app.todos.filtered(app.todo_filter).into_iter().cloned().collect();
            if items.is_empty() {
                ui.add_space(12.0);
                ui.label(RichText::new("Nothing here.").color(theme::TEXT_DIM));
            }

            egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
                for todo in &items {
                    ui.horizontal(|ui| {
                        let arrow = if todo.expanded { icons::CARET_DOWN } else { icons::CARET_RIGHT };
                        if ui.small_button(arrow).clicked() {
                            actions.push(TodoAction::ToggleExpanded(todo.id));
                        }
                        let mut done = todo.completed;
                        if ui.checkbox(&mut done, "").changed() {
                            actions.push(TodoAction::Toggle(todo.id));
                        }
                        todo_text(ui, app.todo_edit.as_mut(), todo.id, None, &todo.text, todo.completed, &mut actions);

                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.small_button(icons::TRASH).on_hover_text("Delete").clicked() {
                                actions.push(TodoAction::Delete(todo.id));
                            }
                            if !todo.subtasks.is_empty() {
                                let done = todo.subtasks.iter().filter(|s| s.completed).count();
                                ui.label(
                                    RichText::new(format!("{}/{}", done, todo.subtasks.len()))
                                        .small()
                                        .color(theme::TEXT_DIM),
                                );
                            }
                        });
                    });

                    if todo.expanded {
                        ui.indent(("subtasks", todo.id), |ui| {
                            for sub in &todo.subtasks {
                                ui.horizontal(|ui| {
                                    let mut done = sub.completed;
                                    if ui.checkbox(&mut done, "").changed() {
                                        actions.push(TodoAction::ToggleSubtask(todo.id, sub.id));
                                    }
                                    todo_text(
                                        ui,
                                        app.todo_edit.as_mut(),
                                        todo.id,
                                        Some(sub.id),
                                        &sub.text,
                                        sub.completed,
                                        &mut actions,
                                    );
                                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                        if ui.small_button(icons::X).clicked() {
                                            actions.push(TodoAction::DeleteSubtask(todo.id, sub.id));
                                        }
                                    });
                                });
                            }
                            ui.horizontal(|ui| {
                                let input = app.subtask_inputs.entry(todo.id).or_default();
                                let resp = ui.add_sized(
                                    [220.0, 22.0],
                                    egui::TextEdit::singleline(input).hint_text("Add a subtask..."),
                                );
                                let submitted =
                                    resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                                if ui.small_button(icons::PLUS).clicked() || submitted {
                                    actions.push(TodoAction::AddSubtask(todo.id));
                                }
                            });
                        });
                    }
                    ui.add_space(2.0);
                }
            });
        });

    apply_actions(app, actions);
}

/// Static text, or an inline editor when this item is the one being edited.
fn todo_text(
    ui: &mut Ui,
    edit: Option<&mut TodoEdit>,
    todo_id: Uuid,
    subtask_id: Option<Uuid>,
    text: &str,
    completed: bool,
    actions: &mut Vec<TodoAction>,
) {
    if let Some(edit) = edit.filter(|e| e.todo_id == todo_id && e.subtask_id == subtask_id) {
        let resp = ui.add(egui::TextEdit::singleline(&mut edit.text).desired_width(260.0));
        resp.request_focus();
        if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
            actions.push(TodoAction::CancelEdit);
        } else if resp.lost_focus() {
            actions.push(TodoAction::CommitEdit);
        }
        return;
    }

    let mut rich = RichText::new(text);
    if completed {
        rich = rich.strikethrough().color(theme::TEXT_DIM);
    } else {
        rich = rich.color(Color32::from_gray(225));
    }
    let resp = ui
        .add(egui::Label::new(rich).sense(egui::Sense::click()))
        .on_hover_text("Double-click to edit");
    if resp.double_clicked() {
        actions.push(TodoAction::BeginEdit(TodoEdit {
            todo_id,
            subtask_id,
            text: text.to_string(),
        }));
    }
}

fn apply_actions(app: &mut TimelineApp, actions: Vec<TodoAction>) {
    let mut changed = false;
    for action in actions {
        changed |= match action {
            TodoAction::Toggle(id) => app.todos.toggle(id),
            TodoAction::ToggleExpanded(id) => app.todos.toggle_expanded(id),
            TodoAction::Delete(id) => app.todos.delete(id),
            TodoAction::ToggleSubtask(parent, id) => app.todos.toggle_subtask(parent, id),
            TodoAction::DeleteSubtask(parent, id) => app.todos.delete_subtask(parent, id),
            TodoAction::AddSubtask(parent) => {
                let text = app.subtask_inputs.remove(&parent).unwrap_or_default();
                app.todos.add_subtask(parent, &text, Utc::now()).is_some()
            }
            TodoAction::BeginEdit(edit) => {
                app.todo_edit = Some(edit);
                false
            }
            TodoAction::CommitEdit => match app.todo_edit.take() {
                Some(TodoEdit {
                    todo_id,
                    subtask_id: Some(sub),
                    text,
                }) => app.todos.edit_subtask(todo_id, sub, &text),
                Some(TodoEdit { todo_id, text, .. }) => app.todos.edit(todo_id, &text),
                None => false,
            },
            TodoAction::CancelEdit => {
                app.todo_edit = None;
                false
            }
        };
    }
    if changed {
        app.save_todos("Todos saved");
    }
}
