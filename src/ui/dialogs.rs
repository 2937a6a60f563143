use crate::app::TimelineApp;
use crate::ui::theme;
use egui::{Color32, Context, RichText, Window};

const DIALOG_WIDTH: f32 = 320.0;

fn primary_button(text: &str) -> egui::Button<'_> {
    egui::Button::new(RichText::new(text).color(Color32::WHITE))
        .fill(theme::ACCENT)
        .rounding(egui::Rounding::same(4.0))
}

fn escape_pressed(ctx: &Context) -> bool {
    ctx.input(|i| i.key_pressed(egui::Key::Escape))
}

/// Palette popup for a right-clicked stream, shown where the click happened.
pub fn show_color_menu(app: &mut TimelineApp, ctx: &Context) {
    let Some(menu) = app.color_menu.clone() else {
        return;
    };
    let current = app.project.stream(menu.stream_id).map(|s| s.color);
    let Some(current) = current else {
        app.color_menu = None;
        return;
    };

    let mut picked = None;
    let mut add_flag = false;
    let area = egui::Area::new(egui::Id::new("stream-color-menu"))
        .order(egui::Order::Foreground)
        .fixed_pos(menu.pos)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.label(RichText::new("Color").small().weak());
                ui.horizontal(|ui| {
                    for (idx, color) in theme::STREAM_PALETTE.iter().enumerate() {
                        let (rect, resp) =
                            ui.allocate_exact_size(egui::vec2(22.0, 22.0), egui::Sense::click());
                        ui.painter().rect_filled(rect, 4.0, *color);
                        if idx == current {
                            ui.painter().rect_stroke(rect.expand(1.5), 5.0, egui::Stroke::new(2.0, Color32::WHITE));
                        }
                        if resp.on_hover_text(theme::STREAM_PALETTE_NAMES[idx]).clicked() {
                            picked = Some(idx);
                        }
                    }
                });
                ui.separator();
                if ui.button("Add deadline here").clicked() {
                    add_flag = true;
                }
            });
        });

    if let Some(idx) = picked {
        app.set_stream_color(menu.stream_id, idx);
        app.color_menu = None;
    } else if add_flag {
        app.color_menu = None;
        app.add_deadline(menu.stream_id, menu.at);
    } else if escape_pressed(ctx)
        || (ctx.input(|i| i.pointer.primary_clicked()) && !area.response.contains_pointer())
    {
        app.color_menu = None;
    }
}

/// Edit or delete a deadline flag's comment.
pub fn show_deadline_editor(app: &mut TimelineApp, ctx: &Context) {
    let Some(mut editor) = app.deadline_editor.take() else {
        return;
    };
    let mut save = false;
    let mut delete = false;
    let mut close = false;

    Window::new(RichText::new("Deadline").strong().size(14.0))
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([DIALOG_WIDTH, 0.0])
        .show(ctx, |ui| {
            ui.label(RichText::new("Comment").color(theme::TEXT_SECONDARY));
            let resp = ui.add(
                egui::TextEdit::singleline(&mut editor.text)
                    .hint_text("What is due?")
                    .desired_width(f32::INFINITY),
            );
            if resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                save = true;
            } else if !resp.has_focus() && !resp.lost_focus() {
                resp.request_focus();
            }

            ui.add_space(6.0);
            ui.separator();
            ui.horizontal(|ui| {
                if ui.add_sized([80.0, 28.0], primary_button("Save")).clicked() {
                    save = true;
                }
                if ui.add_sized([80.0, 28.0], egui::Button::new("Delete")).clicked() {
                    delete = true;
                }
                if ui.add_sized([80.0, 28.0], egui::Button::new("Cancel")).clicked() {
                    close = true;
                }
            });
        });

    if save {
        app.save_deadline_comment(editor.deadline_id, &editor.text);
    } else if delete {
        app.remove_deadline(editor.deadline_id);
    } else if !close && !escape_pressed(ctx) {
        app.deadline_editor = Some(editor);
    }
}

/// Rename, reschedule or delete a stream.
pub fn show_stream_editor(app: &mut TimelineApp, ctx: &Context) {
    let Some(mut editor) = app.stream_editor.take() else {
        return;
    };
    let mut save = false;
    let mut delete = false;
    let mut close = false;

    Window::new(RichText::new("Stream").strong().size(14.0))
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([DIALOG_WIDTH, 0.0])
        .show(ctx, |ui| {
            egui::Grid::new("stream_editor_grid")
                .num_columns(2)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    ui.label(RichText::new("Label").color(theme::TEXT_SECONDARY));
                    ui.add_sized(
                        [200.0, 24.0],
                        egui::TextEdit::singleline(&mut editor.label).hint_text("Stream name..."),
                    );
                    ui.end_row();

                    ui.label(RichText::new("Start").color(theme::TEXT_SECONDARY));
                    let resp = ui.add(
                        egui_extras::DatePickerButton::new(&mut editor.start).id_salt("stream_dp_start"),
                    );
                    if resp.changed() && editor.start > editor.end {
                        editor.end = editor.start;
                    }
                    ui.end_row();

                    ui.label(RichText::new("End").color(theme::TEXT_SECONDARY));
                    let resp = ui.add(
                        egui_extras::DatePickerButton::new(&mut editor.end).id_salt("stream_dp_end"),
                    );
                    if resp.changed() && editor.end < editor.start {
                        editor.start = editor.end;
                    }
                    ui.end_row();
                });

            ui.add_space(6.0);
            ui.separator();
            ui.horizontal(|ui| {
                if ui.add_sized([80.0, 28.0], primary_button("Save")).clicked() {
                    save = true;
                }
                if ui.add_sized([80.0, 28.0], egui::Button::new("Cancel")).clicked() {
                    close = true;
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let delete_btn = egui::Button::new(RichText::new("Delete").color(theme::TODAY_LINE));
                    if ui.add_sized([80.0, 28.0], delete_btn).clicked() {
                        delete = true;
                    }
                });
            });
        });

    if save {
        app.save_stream_editor(&editor);
    } else if delete {
        let confirm = rfd::MessageDialog::new()
            .set_title("Delete Stream")
            .set_description(format!("Delete '{}' and its deadlines?", editor.label))
            .set_buttons(rfd::MessageButtons::YesNo)
            .show();
        if confirm == rfd::MessageDialogResult::Yes {
            app.delete_stream(editor.stream_id);
        } else {
            app.stream_editor = Some(editor);
        }
    } else if !close && !escape_pressed(ctx) {
        app.stream_editor = Some(editor);
    }
}

/// Project name, date range, progress and notes.
pub fn show_project_dialog(app: &mut TimelineApp, ctx: &Context) {
    let Some(mut draft) = app.project_draft.take() else {
        return;
    };
    let mut save = false;
    let mut close = false;

    Window::new(RichText::new("Project").strong().size(14.0))
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([DIALOG_WIDTH + 60.0, 0.0])
        .show(ctx, |ui| {
            egui::Grid::new("project_grid")
                .num_columns(2)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    ui.label(RichText::new("Name").color(theme::TEXT_SECONDARY));
                    ui.add_sized([220.0, 24.0], egui::TextEdit::singleline(&mut draft.name));
                    ui.end_row();

                    ui.label(RichText::new("Start").color(theme::TEXT_SECONDARY));
                    ui.add(egui_extras::DatePickerButton::new(&mut draft.start).id_salt("project_dp_start"));
                    ui.end_row();

                    ui.label(RichText::new("End").color(theme::TEXT_SECONDARY));
                    ui.add(egui_extras::DatePickerButton::new(&mut draft.end).id_salt("project_dp_end"));
                    ui.end_row();

                    ui.label(RichText::new("Progress").color(theme::TEXT_SECONDARY));
                    ui.add(egui::Slider::new(&mut draft.progress, 0..=100).suffix("%"));
                    ui.end_row();
                });
            ui.label(RichText::new("Notes").color(theme::TEXT_SECONDARY));
            ui.add(
                egui::TextEdit::multiline(&mut draft.notes)
                    .desired_rows(4)
                    .desired_width(f32::INFINITY),
            );

            ui.add_space(6.0);
            ui.separator();
            ui.horizontal(|ui| {
                if ui.add_sized([80.0, 28.0], primary_button("Save")).clicked() {
                    save = true;
                }
                if ui.add_sized([80.0, 28.0], egui::Button::new("Cancel")).clicked() {
                    close = true;
                }
            });
        });

    if save {
        app.save_project_draft(&draft);
    } else if !close && !escape_pressed(ctx) {
        app.project_draft = Some(draft);
    }
}

/// Archived todos grouped by day.
pub fn show_history_dialog(app: &mut TimelineApp, ctx: &Context) {
    let mut should_close = false;
    Window::new(RichText::new("History").strong().size(14.0))
        .resizable(true)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .default_size([420.0, 440.0])
        .show(ctx, |ui| {
            let groups = app.todos.history();
            if groups.is_empty() {
                ui.label(RichText::new("Nothing archived yet.").weak());
            }
            egui::ScrollArea::vertical().max_height(380.0).show(ui, |ui| {
                for group in &groups {
                    let done = group.todos.iter().filter(|t| t.completed).count();
                    ui.label(
                        RichText::new(format!(
                            "{}  ·  {}/{} done",
                            group.date.format("%A, %b %d %Y"),
                            done,
                            group.todos.len()
                        ))
                        .strong(),
                    );
                    for todo in &group.todos {
                        let (mark, color) = if todo.completed {
                            (egui_phosphor::regular::CHECK_SQUARE, theme::DONE_COLOR)
                        } else {
                            (egui_phosphor::regular::SQUARE, theme::TEXT_DIM)
                        };
                        ui.label(RichText::new(format!("{} {}", mark, todo.text)).color(color));
                        for sub in &todo.subtasks {
                            let mark = if sub.completed { "✓" } else { "·" };
                            ui.label(RichText::new(format!("      {} {}", mark, sub.text)).small().weak());
                        }
                    }
                    ui.add_space(8.0);
                }
            });
            ui.separator();
            if ui.add_sized([80.0, 28.0], egui::Button::new("Close")).clicked() {
                should_close = true;
            }
        });
    if should_close || escape_pressed(ctx) {
        app.show_history = false;
    }
}

/// Render the "About" dialog.
pub fn show_about_dialog(app: &mut TimelineApp, ctx: &Context) {
    let mut should_close = false;
    Window::new("About")
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([300.0, 190.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(12.0);
                ui.heading(RichText::new("Stream Timeline").strong());
                ui.add_space(2.0);
                ui.label(
                    RichText::new(format!("Version {}", env!("CARGO_PKG_VERSION")))
                        .color(theme::TEXT_SECONDARY),
                );
                ui.add_space(10.0);
                ui.label("Plan work as streams on a rolling timeline.");
                ui.label("Drag to move, pull the edges to resize.");
                ui.add_space(14.0);
                if ui.add_sized([100.0, 28.0], egui::Button::new("Close")).clicked() {
                    should_close = true;
                }
            });
        });
    if should_close || escape_pressed(ctx) {
        app.show_about = false;
    }
}
