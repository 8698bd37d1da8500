use eframe::{
    egui::{Color32, Frame, Margin, Rounding, Stroke, Visuals},
    emath::Vec2,
};

use super::state::NoticeLevel;

pub struct AppTheme {
    pub colors: Colors,
    pub visuals: Visuals,
    pub default_panel_frame: Frame,
    pub prompt_frame: Frame,
    pub spacing: Spacing,
    pub rounding: RoundingTypes,
}

impl AppTheme {
    pub const fn notice_color(&self, level: NoticeLevel) -> Color32 {
        match level {
            NoticeLevel::Info => self.colors.info,
            NoticeLevel::Warning => self.colors.warning,
            NoticeLevel::Error => self.colors.error_message,
        }
    }
}

impl Default for AppTheme {
    fn default() -> Self {
        let colors = Colors::default();
        let rounding = RoundingTypes::default();

        let mut visuals = Visuals::dark();
        visuals.override_text_color = Some(colors.white);
        visuals.extreme_bg_color = colors.darker_gray;
        visuals.panel_fill = colors.gray;
        visuals.window_fill = colors.gray;
        visuals.selection.bg_fill = colors.light_gray;
        visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, colors.dark_gray);
        visuals.widgets.inactive.bg_fill = colors.dark_gray;
        visuals.widgets.inactive.weak_bg_fill = colors.dark_gray;
        visuals.widgets.inactive.rounding = rounding.small;
        visuals.widgets.hovered.rounding = rounding.small;
        visuals.widgets.active.rounding = rounding.small;

        let default_panel_frame = Frame {
            inner_margin: Margin::same(16.0),
            fill: colors.gray,
            ..Frame::default()
        };

        let prompt_frame = Frame {
            inner_margin: Margin::same(16.0),
            fill: colors.darker_gray,
            rounding: rounding.big,
            ..Frame::default()
        };

        Self {
            colors,
            visuals,
            default_panel_frame,
            prompt_frame,
            spacing: Spacing::default(),
            rounding,
        }
    }
}

pub struct Colors {
    pub white: Color32,
    pub gray: Color32,
    pub dark_gray: Color32,
    pub darker_gray: Color32,
    pub light_gray: Color32,
    pub lighter_gray: Color32,
    pub info: Color32,
    pub warning: Color32,
    pub error_message: Color32,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            white: Color32::from_rgb(255, 255, 255),
            gray: Color32::from_rgb(40, 42, 47),
            dark_gray: Color32::from_rgb(55, 57, 63),
            darker_gray: Color32::from_rgb(30, 31, 35),
            light_gray: Color32::from_rgb(80, 84, 92),
            lighter_gray: Color32::from_rgb(150, 152, 158),
            info: Color32::from_rgb(70, 150, 90),
            warning: Color32::from_rgb(200, 150, 40),
            error_message: Color32::from_rgb(190, 60, 60),
        }
    }
}

pub struct Spacing {
    pub widget_spacing: Vec2,
    pub large: f32,
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            widget_spacing: Vec2::new(8.0, 8.0),
            large: 16.0,
        }
    }
}

pub struct RoundingTypes {
    pub small: Rounding,
    pub big: Rounding,
}

impl Default for RoundingTypes {
    fn default() -> Self {
        Self {
            small: Rounding::same(2.0),
            big: Rounding::same(6.0),
        }
    }
}
