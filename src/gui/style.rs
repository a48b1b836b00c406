use iced::{Background, Border, Color, Shadow, Theme, Vector};
use iced::widget::button::{self, Appearance as ButtonAppearance};
use iced::widget::container::{self, Appearance as ContainerAppearance};

pub const BRAND: Color = Color { r: 0xc8 as f32 / 255.0, g: 0x10 as f32 / 255.0, b: 0x2e as f32 / 255.0, a: 1.0 };
pub const BACKGROUND: Color = Color { r: 0xfc as f32 / 255.0, g: 0xe6 as f32 / 255.0, b: 0xeb as f32 / 255.0, a: 1.0 };
pub const MUTED: Color = Color { r: 0.4, g: 0.4, b: 0.4, a: 1.0 };
const UNLIT: Color = Color { r: 0.8, g: 0.8, b: 0.8, a: 0.4 };

pub struct BrandButtonStyleSheet;

impl button::StyleSheet for BrandButtonStyleSheet {
    type Style = Theme;

    fn active(&self, _style: &Self::Style) -> ButtonAppearance {
        ButtonAppearance {
            shadow_offset: Vector::new(0.0, 2.0),
            background: Some(Background::Color(BRAND)),
            text_color: Color::WHITE,
            border: Border {
                color: Color::TRANSPARENT,
                width: 0.0,
                radius: 6.0.into(),
            },
            shadow: Shadow::default(),
        }
    }
}

// The navbar title: text only
pub struct TextButtonStyleSheet;

impl button::StyleSheet for TextButtonStyleSheet {
    type Style = Theme;

    fn active(&self, _style: &Self::Style) -> ButtonAppearance {
        ButtonAppearance {
            shadow_offset: Default::default(),
            background: None,
            text_color: Color::WHITE,
            border: Border {
                color: Color::TRANSPARENT,
                width: 0.0,
                radius: 0.0.into(),
            },
            shadow: Shadow::default(),
        }
    }
}

pub struct NavbarStyleSheet;

impl container::StyleSheet for NavbarStyleSheet {
    type Style = Theme;

    fn appearance(&self, _style: &Self::Style) -> ContainerAppearance {
        ContainerAppearance {
            text_color: Some(Color::WHITE),
            background: Some(Background::Color(BRAND)),
            border: Border::default(),
            shadow: Shadow::default(),
        }
    }
}

pub struct ScreenStyleSheet;

impl container::StyleSheet for ScreenStyleSheet {
    type Style = Theme;

    fn appearance(&self, _style: &Self::Style) -> ContainerAppearance {
        ContainerAppearance {
            text_color: None,
            background: Some(Background::Color(BACKGROUND)),
            border: Border::default(),
            shadow: Shadow::default(),
        }
    }
}

pub struct CardStyleSheet;

impl container::StyleSheet for CardStyleSheet {
    type Style = Theme;

    fn appearance(&self, _style: &Self::Style) -> ContainerAppearance {
        ContainerAppearance {
            text_color: Some(Color::BLACK),
            background: Some(Background::Color(Color::WHITE)),
            border: Border {
                color: Color::TRANSPARENT,
                width: 0.0,
                radius: 10.0.into(),
            },
            shadow: Shadow {
                color: Color { a: 0.15, ..Color::BLACK },
                offset: Vector::new(0.0, 5.0),
                blur_radius: 10.0,
            },
        }
    }
}

/// One light of the status screen's traffic light.
pub struct LightStyleSheet {
    pub color: Color,
    pub lit: bool,
}

impl container::StyleSheet for LightStyleSheet {
    type Style = Theme;

    fn appearance(&self, _style: &Self::Style) -> ContainerAppearance {
        ContainerAppearance {
            text_color: None,
            background: Some(Background::Color(if self.lit { self.color } else { UNLIT })),
            border: Border {
                color: Color::from_rgb8(0x99, 0x99, 0x99),
                width: if self.lit { 3.0 } else { 2.0 },
                radius: 20.0.into(),
            },
            shadow: Shadow::default(),
        }
    }
}
