//! This Rust `embedded-hal`-based library is a simple way to control a [HD44780](https://en.wikipedia.org/wiki/Hitachi_HD44780_LCD_controller)
//! compatible character display wired directly to GPIO pins in an embedded, `no_std` environment. Both parallel
//! bus widths of the controller are supported:
//!
//! - **4-bit bus** - The most common wiring. Uses the controller's D4-D7 data lines and transfers every byte as
//!   two nibbles, high nibble first. Saves four pins at the cost of two enable cycles per byte.
//! - **8-bit bus** - Uses all eight data lines and transfers every byte in a single enable cycle.
//!
//! In either width the read/write select line is optional: leave it wired to ground and construct the driver
//! without it, or hand the driver the pin and it will hold the line in write mode itself.
//!
//! Key features include:
//! - Convenient high-level API for controlling the display
//! - Support for custom characters
//! - Backlight control, including inverted-polarity and PWM-dimmed backlights
//! - `core::fmt::Write` implementation for easy use with the `write!` macro
//! - Compatible with the `embedded-hal` traits v1.0 and later
//! - Optional support for the `defmt` and `ufmt` logging frameworks
//!
//! ## Usage
//! Add this to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! gpio-character-display = { version = "0.2", features = ["defmt"] }
//! ```
//! The `features = ["defmt"]` line is optional and enables the `defmt` feature, which allows the library's errors
//! to be used with the `defmt` logging framework. Another optional feature is `features = ["ufmt"]`, which enables
//! the `ufmt` feature, allowing the `uwriteln!` and `uwrite!` macros to be used.
//!
//! Then pick the constructor matching your wiring:
//! ```rust
//! use gpio_character_display::CharacterDisplay;
//!
//! // board setup
//! let (rs, enable) = ...;     // embedded-hal output pins
//! let (d4, d5, d6, d7) = ...; // data line pins
//! let delay = ...;            // DelayNs implementation
//!
//! // 4-bit bus, R/W line wired to ground
//! let mut lcd = CharacterDisplay::new_4bit(rs, enable, [d4, d5, d6, d7], delay);
//! // 4-bit bus with a driver-managed R/W pin
//! let mut lcd = CharacterDisplay::new_4bit_with_rw(rs, rw, enable, [d4, d5, d6, d7], delay);
//! // 8-bit bus variants take the full [d0, ..., d7] pin array
//! let mut lcd = CharacterDisplay::new_8bit(rs, enable, [d0, d1, d2, d3, d4, d5, d6, d7], delay);
//! ```
//! Initialize the display before anything else. This is mandatory: it runs the datasheet reset handshake that
//! pins down the bus width, which the controller cannot be queried for.
//! ```rust
//! if let Err(e) = lcd.begin(16, 2) {
//!    panic!("Error initializing LCD: {}", e);
//! }
//! ```
//! Use the display:
//! ```rust
//! // set up the display
//! lcd.clear()?.set_cursor(0, 0)?;
//! // print a message
//! lcd.print("Hello, world!")?;
//! // can also use the `core::fmt::write!` macro
//! use core::fmt::Write;
//!
//! write!(lcd, "Hello, world!")?;
//! ```
//! The various methods for controlling the LCD are also available. Each returns a `Result` that wraps the display
//! object in `Ok()`, allowing for easy chaining of commands. For example:
//! ```rust
//! lcd.clear()?.show_cursor(true)?.print("Hello, world!")?;
//! ```
//!
//! ### Backlight control
//! If the backlight is switched through a plain GPIO pin, hand that pin to the driver along with its polarity:
//! ```rust
//! use gpio_character_display::BacklightMode;
//!
//! lcd.configure_backlight_pin(backlight_pin, BacklightMode::Normal);
//! lcd.set_backlight(255)?;
//! ```
//! A backlight wired to a PWM-capable output can be dimmed through the standalone
//! [`PwmBacklight`] controller, which drives any `embedded_hal::pwm::SetDutyCycle`
//! channel and is fully independent of the display bus.
//!
#![no_std]
#![allow(dead_code)]
use core::fmt::Display;

use embedded_hal::{delay::DelayNs, digital::OutputPin};

mod backlight;
mod bus;
mod registers;

pub use backlight::{BacklightMode, PwmBacklight};
pub use bus::{DataBus, Pins};

use backlight::Backlight;
use bus::ParallelBus;
use registers::{DisplayControl, DisplayFunction, EntryMode};

// commands
const LCD_CMD_CLEARDISPLAY: u8 = 0x01; //  Clear display, set cursor position to zero
const LCD_CMD_RETURNHOME: u8 = 0x02; //  Set cursor position to zero
const LCD_CMD_ENTRYMODESET: u8 = 0x04; //  Sets the entry mode
const LCD_CMD_DISPLAYCONTROL: u8 = 0x08; //  Controls the display; does stuff like turning it off and on
const LCD_CMD_CURSORSHIFT: u8 = 0x10; //  Lets you move the cursor
const LCD_CMD_FUNCTIONSET: u8 = 0x20; //  Used to send the function to set to the display
const LCD_CMD_SETCGRAMADDR: u8 = 0x40; //  Used to set the CGRAM (character generator RAM) with characters
const LCD_CMD_SETDDRAMADDR: u8 = 0x80; //  Used to set the DDRAM (Display Data RAM)

// flags for display entry mode
const LCD_FLAG_ENTRYRIGHT: u8 = 0x00; //  Used to set text to flow from right to left
const LCD_FLAG_ENTRYLEFT: u8 = 0x02; //  Uset to set text to flow from left to right
const LCD_FLAG_ENTRYSHIFTINCREMENT: u8 = 0x01; //  Used to 'right justify' text from the cursor
const LCD_FLAG_ENTRYSHIFTDECREMENT: u8 = 0x00; //  Used to 'left justify' text from the cursor

// flags for display on/off control
const LCD_FLAG_DISPLAYON: u8 = 0x04; //  Turns the display on
const LCD_FLAG_DISPLAYOFF: u8 = 0x00; //  Turns the display off
const LCD_FLAG_CURSORON: u8 = 0x02; //  Turns the cursor on
const LCD_FLAG_CURSOROFF: u8 = 0x00; //  Turns the cursor off
const LCD_FLAG_BLINKON: u8 = 0x01; //  Turns on the blinking cursor
const LCD_FLAG_BLINKOFF: u8 = 0x00; //  Turns off the blinking cursor

// flags for display/cursor shift
const LCD_FLAG_DISPLAYMOVE: u8 = 0x08; //  Flag for moving the display
const LCD_FLAG_CURSORMOVE: u8 = 0x00; //  Flag for moving the cursor
const LCD_FLAG_MOVERIGHT: u8 = 0x04; //  Flag for moving right
const LCD_FLAG_MOVELEFT: u8 = 0x00; //  Flag for moving left

// flags for function set
const LCD_FLAG_8BITMODE: u8 = 0x10; //  LCD 8 bit mode
const LCD_FLAG_4BITMODE: u8 = 0x00; //  LCD 4 bit mode
const LCD_FLAG_2LINE: u8 = 0x08; //  LCD 2 line mode
const LCD_FLAG_1LINE: u8 = 0x00; //  LCD 1 line mode
const LCD_FLAG_5x10_DOTS: u8 = 0x04; //  10 pixel high font mode
const LCD_FLAG_5x8_DOTS: u8 = 0x00; //  8 pixel high font mode

#[derive(Debug)]
/// Errors that can occur when using the character display
pub enum CharacterDisplayError<P>
where
    P: OutputPin,
{
    /// Error returned from the underlying pin implementation
    PinError(P::Error),
    /// Formatting error
    FormattingError(core::fmt::Error),
}

impl<P> From<core::fmt::Error> for CharacterDisplayError<P>
where
    P: OutputPin,
{
    fn from(err: core::fmt::Error) -> Self {
        CharacterDisplayError::FormattingError(err)
    }
}

impl<P> From<&CharacterDisplayError<P>> for &'static str
where
    P: OutputPin,
{
    fn from(err: &CharacterDisplayError<P>) -> Self {
        match err {
            CharacterDisplayError::PinError(_) => "Pin error",
            CharacterDisplayError::FormattingError(_) => "Formatting error",
        }
    }
}

#[cfg(feature = "defmt")]
impl<P> defmt::Format for CharacterDisplayError<P>
where
    P: OutputPin,
{
    fn format(&self, fmt: defmt::Formatter) {
        let msg: &'static str = From::from(self);
        defmt::write!(fmt, "{}", msg);
    }
}

#[cfg(feature = "ufmt")]
impl<P> ufmt::uDisplay for CharacterDisplayError<P>
where
    P: OutputPin,
{
    fn fmt<W>(&self, w: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        let msg: &'static str = From::from(self);
        ufmt::uwrite!(w, "{}", msg)
    }
}

impl<P> Display for CharacterDisplayError<P>
where
    P: OutputPin,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg: &'static str = From::from(self);
        write!(f, "{}", msg)
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
/// The character cell size of the attached display glass. Nearly every module
/// uses 5x8 cells; 5x10 glass exists only in one-line geometries.
pub enum CharacterFont {
    Font5x8,
    Font5x10,
}

/// HD44780 character display connected through a parallel GPIO bus.
///
/// The driver owns its pins and the delay source for its entire lifetime, and
/// mirrors the controller's display-control, entry-mode, and function
/// registers in memory. The controller cannot be queried, so every mutating
/// operation re-transmits the full affected register to keep the mirror and
/// the hardware in lockstep.
pub struct CharacterDisplay<P, DELAY>
where
    P: OutputPin,
    DELAY: DelayNs,
{
    bus: ParallelBus<P>,
    delay: DELAY,
    function: DisplayFunction,
    control: DisplayControl,
    mode: EntryMode,
    num_lines: u8,
    row_offsets: [u8; 4],
    backlight: Option<Backlight<P>>,
}

impl<P, DELAY> CharacterDisplay<P, DELAY>
where
    P: OutputPin,
    DELAY: DelayNs,
{
    /// Create a display on a 4-bit bus with the R/W line wired to ground.
    /// The `data` array holds the pins wired to the controller's D4..D7.
    pub fn new_4bit(rs: P, enable: P, data: [P; 4], delay: DELAY) -> Self {
        Self::new(
            Pins {
                rs,
                rw: None,
                enable,
                data: DataBus::FourBit(data),
            },
            delay,
        )
    }

    /// Create a display on a 4-bit bus with a driver-managed R/W pin.
    pub fn new_4bit_with_rw(rs: P, rw: P, enable: P, data: [P; 4], delay: DELAY) -> Self {
        Self::new(
            Pins {
                rs,
                rw: Some(rw),
                enable,
                data: DataBus::FourBit(data),
            },
            delay,
        )
    }

    /// Create a display on an 8-bit bus with the R/W line wired to ground.
    /// The `data` array holds the pins wired to the controller's D0..D7.
    pub fn new_8bit(rs: P, enable: P, data: [P; 8], delay: DELAY) -> Self {
        Self::new(
            Pins {
                rs,
                rw: None,
                enable,
                data: DataBus::EightBit(data),
            },
            delay,
        )
    }

    /// Create a display on an 8-bit bus with a driver-managed R/W pin.
    pub fn new_8bit_with_rw(rs: P, rw: P, enable: P, data: [P; 8], delay: DELAY) -> Self {
        Self::new(
            Pins {
                rs,
                rw: Some(rw),
                enable,
                data: DataBus::EightBit(data),
            },
            delay,
        )
    }

    /// Create a display from an explicit pin assignment. The bus width is
    /// fixed by the `DataBus` variant and cannot change afterwards. All four
    /// convenience constructors route through here.
    pub fn new(pins: Pins<P>, delay: DELAY) -> Self {
        let mut function = DisplayFunction::default();
        function.set_eight_bit_bus(pins.data.is_eight_bit());
        Self {
            bus: ParallelBus::new(pins),
            delay,
            function,
            control: DisplayControl::default(),
            mode: EntryMode::default(),
            num_lines: 1,
            row_offsets: [0x00, 0x40, 0x00, 0x40],
            backlight: None,
        }
    }

    /// Initialize the display with the given geometry and a 5x8 font. This
    /// must be called before using the display.
    pub fn begin(&mut self, cols: u8, rows: u8) -> Result<&mut Self, CharacterDisplayError<P>> {
        self.begin_with_font(cols, rows, CharacterFont::Font5x8)
    }

    /// Initialize the display with the given geometry and font.
    ///
    /// Runs the datasheet reset handshake, which works regardless of whether
    /// the controller powered up expecting a 4-bit or an 8-bit host, then
    /// programs line count and font and leaves the display on, cleared, with
    /// the cursor hidden and text flowing left to right.
    ///
    /// 5x10 glass only exists in one-line geometries; requesting `Font5x10`
    /// with more than one row quietly falls back to the 5x8 font.
    pub fn begin_with_font(
        &mut self,
        cols: u8,
        rows: u8,
        font: CharacterFont,
    ) -> Result<&mut Self, CharacterDisplayError<P>> {
        self.function.set_two_line(rows > 1);
        self.function
            .set_large_font(font == CharacterFont::Font5x10 && rows == 1);
        self.num_lines = rows;
        self.row_offsets = [0x00, 0x40, 0x00u8.wrapping_add(cols), 0x40u8.wrapping_add(cols)];

        // the controller needs upwards of 40 ms after Vcc rises before it
        // will accept the handshake
        self.delay.delay_us(50_000);
        self.bus.prepare()?;

        if self.bus.is_four_bit() {
            // reset-by-instruction: three "8-bit function set" nibbles pull
            // the chip into a known state from either width, then one nibble
            // switches it to 4-bit transfers
            self.bus.write_nibble(&mut self.delay, 0x03)?;
            self.delay.delay_us(4500);
            self.bus.write_nibble(&mut self.delay, 0x03)?;
            self.delay.delay_us(4500);
            self.bus.write_nibble(&mut self.delay, 0x03)?;
            self.delay.delay_us(150);
            self.bus.write_nibble(&mut self.delay, 0x02)?;
        } else {
            self.command(self.function.command_byte())?;
            self.delay.delay_us(4500);
            self.command(self.function.command_byte())?;
            self.delay.delay_us(150);
            self.command(self.function.command_byte())?;
        }

        // latch line count and font through normal command framing
        self.command(self.function.command_byte())?;

        self.control.set_display_on(true);
        self.control.set_cursor_on(false);
        self.control.set_blink_on(false);
        self.command(self.control.command_byte())?;

        self.clear()?;

        self.mode.set_left_to_right(true);
        self.mode.set_autoscroll(false);
        self.command(self.mode.command_byte())?;

        #[cfg(feature = "defmt")]
        defmt::debug!("display initialized: {}x{}", cols, rows);

        Ok(self)
    }

    /// Sends a raw command byte to the controller. Normally users do not need
    /// to call this directly.
    pub fn command(&mut self, command: u8) -> Result<(), CharacterDisplayError<P>> {
        self.bus.transmit(&mut self.delay, false, command)
    }

    /// Sets the settle delay applied after each enable pulse, in
    /// microseconds. Values below 1 are clamped to 1; the controller's own
    /// minimum cannot be undercut.
    pub fn set_settle_time(&mut self, settle_time_us: u32) -> &mut Self {
        self.bus.set_settle_time_us(settle_time_us);
        self
    }

    /// Overrides the logical-row to DDRAM base address table, for displays
    /// with non-standard addressing such as some 16x4 modules. Pure state
    /// mutation; nothing is sent on the bus.
    pub fn set_row_offsets(&mut self, offsets: [u8; 4]) -> &mut Self {
        self.row_offsets = offsets;
        self
    }

    //--------------------------------------------------------------------------------------------------
    // high level commands, for the user!
    //--------------------------------------------------------------------------------------------------

    /// Clear the display. Slow: the controller needs about 2 ms to complete
    /// this internally and offers no completion signal, so the driver blocks
    /// for the worst case.
    pub fn clear(&mut self) -> Result<&mut Self, CharacterDisplayError<P>> {
        self.command(LCD_CMD_CLEARDISPLAY)?;
        self.delay.delay_us(2000);
        Ok(self)
    }

    /// Set the cursor to the home position. As slow as [`clear`](Self::clear);
    /// `set_cursor(0, 0)` reaches the same position much faster.
    pub fn home(&mut self) -> Result<&mut Self, CharacterDisplayError<P>> {
        self.command(LCD_CMD_RETURNHOME)?;
        self.delay.delay_us(2000);
        Ok(self)
    }

    /// Set the cursor position at specified column and row. Columns and rows
    /// are zero-indexed. A row beyond the configured geometry is quietly
    /// clamped to the last row, so degenerate requests land on-screen instead
    /// of in unmapped DDRAM.
    pub fn set_cursor(&mut self, col: u8, row: u8) -> Result<&mut Self, CharacterDisplayError<P>> {
        let max_rows = self.row_offsets.len() as u8;
        let mut row = row;
        if row >= max_rows {
            row = max_rows - 1;
        }
        if row >= self.num_lines {
            row = self.num_lines.saturating_sub(1);
        }
        self.command(LCD_CMD_SETDDRAMADDR | self.row_offsets[row as usize].wrapping_add(col))?;
        Ok(self)
    }

    /// Set the cursor visibility.
    pub fn show_cursor(
        &mut self,
        show_cursor: bool,
    ) -> Result<&mut Self, CharacterDisplayError<P>> {
        self.control.set_cursor_on(show_cursor);
        self.command(self.control.command_byte())?;
        Ok(self)
    }

    /// Set the cursor blinking.
    pub fn blink_cursor(
        &mut self,
        blink_cursor: bool,
    ) -> Result<&mut Self, CharacterDisplayError<P>> {
        self.control.set_blink_on(blink_cursor);
        self.command(self.control.command_byte())?;
        Ok(self)
    }

    /// Set the display visibility.
    pub fn show_display(
        &mut self,
        show_display: bool,
    ) -> Result<&mut Self, CharacterDisplayError<P>> {
        self.control.set_display_on(show_display);
        self.command(self.control.command_byte())?;
        Ok(self)
    }

    /// Scroll the display contents one cell to the left.
    pub fn scroll_display_left(&mut self) -> Result<&mut Self, CharacterDisplayError<P>> {
        self.command(LCD_CMD_CURSORSHIFT | LCD_FLAG_DISPLAYMOVE | LCD_FLAG_MOVELEFT)?;
        Ok(self)
    }

    /// Scroll the display contents one cell to the right.
    pub fn scroll_display_right(&mut self) -> Result<&mut Self, CharacterDisplayError<P>> {
        self.command(LCD_CMD_CURSORSHIFT | LCD_FLAG_DISPLAYMOVE | LCD_FLAG_MOVERIGHT)?;
        Ok(self)
    }

    /// Set the text flow direction to left to right.
    pub fn left_to_right(&mut self) -> Result<&mut Self, CharacterDisplayError<P>> {
        self.mode.set_left_to_right(true);
        self.command(self.mode.command_byte())?;
        Ok(self)
    }

    /// Set the text flow direction to right to left.
    pub fn right_to_left(&mut self) -> Result<&mut Self, CharacterDisplayError<P>> {
        self.mode.set_left_to_right(false);
        self.command(self.mode.command_byte())?;
        Ok(self)
    }

    /// Set the auto scroll mode.
    pub fn autoscroll(&mut self, autoscroll: bool) -> Result<&mut Self, CharacterDisplayError<P>> {
        self.mode.set_autoscroll(autoscroll);
        self.command(self.mode.command_byte())?;
        Ok(self)
    }

    /// Create a new custom character in one of the controller's 8 glyph
    /// slots. The index is masked to the 3 bits the controller decodes, so
    /// out-of-range slots wrap rather than fail.
    pub fn create_char(
        &mut self,
        location: u8,
        charmap: [u8; 8],
    ) -> Result<&mut Self, CharacterDisplayError<P>> {
        let location = location & 0x7;
        self.command(LCD_CMD_SETCGRAMADDR | (location << 3))?;
        for &charmap_byte in charmap.iter() {
            self.bus.transmit(&mut self.delay, true, charmap_byte)?;
        }
        Ok(self)
    }

    /// Writes a single character byte to the display at the current cursor
    /// position. Returns the number of bytes accepted, which is always 1;
    /// text-formatting layers compose on top of this count.
    pub fn write_byte(&mut self, byte: u8) -> Result<usize, CharacterDisplayError<P>> {
        self.bus.transmit(&mut self.delay, true, byte)?;
        Ok(1)
    }

    /// Prints a string to the LCD at the current cursor position.
    pub fn print(&mut self, text: &str) -> Result<&mut Self, CharacterDisplayError<P>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("printing: {}", text);
        for &byte in text.as_bytes() {
            self.write_byte(byte)?;
        }
        Ok(self)
    }

    /// Configure a backlight pin that is switched through a plain GPIO
    /// output. `BacklightMode::Normal` is logic high for backlight on;
    /// `BacklightMode::Inverted` is logic low for backlight on. For
    /// PWM-dimmed backlights see [`PwmBacklight`].
    pub fn configure_backlight_pin(&mut self, pin: P, mode: BacklightMode) -> &mut Self {
        self.backlight = Some(Backlight::new(pin, mode));
        self
    }

    /// Sets the backlight level. Any nonzero level switches the backlight on.
    /// A no-op when no backlight pin has been configured.
    pub fn set_backlight(&mut self, level: u8) -> Result<&mut Self, CharacterDisplayError<P>> {
        if let Some(backlight) = self.backlight.as_mut() {
            backlight
                .set_level(level)
                .map_err(CharacterDisplayError::PinError)?;
        }
        Ok(self)
    }

    /// Turn the backlight on or off.
    pub fn backlight(&mut self, on: bool) -> Result<&mut Self, CharacterDisplayError<P>> {
        self.set_backlight(if on { u8::MAX } else { 0 })
    }
}

/// Implement the `core::fmt::Write` trait for the display, allowing it to be
/// used with the `write!` macro. This is a convenience method for printing to
/// the display at the current cursor position.
impl<P, DELAY> core::fmt::Write for CharacterDisplay<P, DELAY>
where
    P: OutputPin,
    DELAY: DelayNs,
{
    fn write_str(&mut self, s: &str) -> Result<(), core::fmt::Error> {
        if let Err(_e) = self.print(s) {
            return Err(core::fmt::Error);
        }
        Ok(())
    }
}

#[cfg(feature = "ufmt")]
/// Implement the `ufmt::uWrite` trait for the display, allowing it to be used
/// with the `uwriteln!` and `uwrite!` macros.
impl<P, DELAY> ufmt::uWrite for CharacterDisplay<P, DELAY>
where
    P: OutputPin,
    DELAY: DelayNs,
{
    fn write_str(&mut self, s: &str) -> Result<(), CharacterDisplayError<P>> {
        if let Err(e) = self.print(s) {
            return Err(e);
        }
        Ok(())
    }

    type Error = CharacterDisplayError<P>;
}
