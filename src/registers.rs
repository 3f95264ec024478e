//! In-memory mirrors of the HD44780 configuration registers.
//!
//! The controller offers no way to read these registers back, so the driver
//! keeps its own image of each one and re-transmits the whole register on
//! every change. Each mirror is a named-bit view over the raw byte plus a
//! pure function producing the full command byte for the bus.

use bitfield::bitfield;

use crate::{LCD_CMD_DISPLAYCONTROL, LCD_CMD_ENTRYMODESET, LCD_CMD_FUNCTIONSET};

bitfield! {
    /// Function-set register image: bus width, line count, and font size.
    /// Established during `begin` and never altered afterwards.
    pub struct DisplayFunction(u8);
    impl Debug;
    pub eight_bit_bus, set_eight_bit_bus: 4;
    pub two_line, set_two_line: 3;
    pub large_font, set_large_font: 2;
}

impl Default for DisplayFunction {
    fn default() -> Self {
        DisplayFunction(0)
    }
}

impl DisplayFunction {
    pub fn command_byte(&self) -> u8 {
        LCD_CMD_FUNCTIONSET | self.0
    }
}

bitfield! {
    /// Display-control register image: display, cursor, and blink bits.
    pub struct DisplayControl(u8);
    impl Debug;
    pub display_on, set_display_on: 2;
    pub cursor_on, set_cursor_on: 1;
    pub blink_on, set_blink_on: 0;
}

impl Default for DisplayControl {
    fn default() -> Self {
        DisplayControl(0)
    }
}

impl DisplayControl {
    pub fn command_byte(&self) -> u8 {
        LCD_CMD_DISPLAYCONTROL | self.0
    }
}

bitfield! {
    /// Entry-mode register image: text direction and autoscroll.
    pub struct EntryMode(u8);
    impl Debug;
    pub left_to_right, set_left_to_right: 1;
    pub autoscroll, set_autoscroll: 0;
}

impl Default for EntryMode {
    fn default() -> Self {
        EntryMode(0)
    }
}

impl EntryMode {
    pub fn command_byte(&self) -> u8 {
        LCD_CMD_ENTRYMODESET | self.0
    }
}
