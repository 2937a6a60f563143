use crate::app::{TimelineApp, View};
use crate::model::WindowSpan;
use crate::ui::theme;
use egui::{menu, RichText, Ui};
use egui_phosphor::regular as icons;

/// Render the top toolbar / menu bar.
pub fn show_toolbar(app: &mut TimelineApp, ui: &mut Ui) {
    menu::bar(ui, |ui| {
        ui.menu_button(RichText::new("  File  ").font(theme::font_menu()), |ui| {
            if ui.button(format!("{} Save          Ctrl+S", icons::FLOPPY_DISK)).clicked() {
                app.save();
                ui.close_menu();
            }
            ui.separator();
            if ui.button(format!("{} Import Project...", icons::DOWNLOAD_SIMPLE)).clicked() {
                app.import_project();
                ui.close_menu();
            }
            if ui.button(format!("{} Export Project...", icons::UPLOAD_SIMPLE)).clicked() {
                app.export_project();
                ui.close_menu();
            }
            if ui.button(format!("{} Export Streams CSV...", icons::FILE_CSV)).clicked() {
                app.export_csv();
                ui.close_menu();
            }
            ui.separator();
            if ui.button(format!("{} Import Todos...", icons::DOWNLOAD_SIMPLE)).clicked() {
                app.import_todos();
                ui.close_menu();
            }
            if ui.button(format!("{} Export Todos...", icons::UPLOAD_SIMPLE)).clicked() {
                app.export_todos();
                ui.close_menu();
            }
            ui.separator();
            if ui.button(format!("{} Open Data Folder", icons::FOLDER_OPEN)).clicked() {
                app.open_data_folder();
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  View  ").font(theme::font_menu()), |ui| {
            if ui.radio_value(&mut app.view, View::Timeline, "Timeline").clicked() {
                ui.close_menu();
            }
            if ui.radio_value(&mut app.view, View::Todos, "Todos").clicked() {
                ui.close_menu();
            }
            ui.separator();
            ui.label(RichText::new("Timeline Span").small().weak());
            for span in WindowSpan::ALL {
                if ui.radio(app.settings.window_span == span, span.label()).clicked() {
                    app.set_window_span(span);
                    ui.close_menu();
                }
            }
        });

        ui.menu_button(RichText::new("  Project  ").font(theme::font_menu()), |ui| {
            if ui.button(format!("{} Project Settings...", icons::GEAR)).clicked() {
                app.open_project_dialog();
                ui.close_menu();
            }
            ui.label(
                RichText::new("Right-click the timeline to add a stream")
                    .small()
                    .weak(),
            );
        });

        ui.menu_button(RichText::new("  Help  ").font(theme::font_menu()), |ui| {
            if ui.button("About").clicked() {
                app.show_about = true;
                ui.close_menu();
            }
        });

        ui.separator();
        ui.selectable_value(&mut app.view, View::Timeline, format!("{} Timeline", icons::CHART_BAR_HORIZONTAL));
        ui.selectable_value(&mut app.view, View::Todos, format!("{} Todos", icons::LIST_CHECKS));

        // Right-aligned project name and progress
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(
                RichText::new(format!("{} · {}%", app.project.name, app.project.progress))
                    .size(11.0)
                    .weak(),
            );
        });
    });
}
