pub mod dialogs;
pub mod theme;
pub mod timeline_view;
pub mod todo_panel;
pub mod toolbar;
