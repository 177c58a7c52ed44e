pub mod a001_custom_widget;
pub mod a002_dashboard_module;
pub mod a003_widget_override;
