/*
===============================================================================

  PROGRAMMERS:

    martin.isenburg@rapidlasso.com  -  http://rapidlasso.com
    uday.karan@gmail.com - Hobu, Inc.

  COPYRIGHT:

    (c) 2007-2014, martin isenburg, rapidlasso - tools to catch reality
    (c) 2014, Uday Verma, Hobu, Inc.
    (c) 2019, Thomas Montaigu

    This is free software; you can redistribute and/or modify it under the
    terms of the GNU Lesser General Licence as published by the Free Software
    Foundation. See the COPYING file for more information.

    This software is distributed WITHOUT ANY WARRANTY and without even the
    implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.

  CHANGE HISTORY:
    6 June 2019: Translated to Rust
===============================================================================
*/

use crate::las::utils::flag_diff;
use crate::packers::Packable;

fn u8_clamp(n: i32) -> u8 {
    if n <= std::u8::MIN as i32 {
        std::u8::MIN
    } else if n >= std::u8::MAX as i32 {
        std::u8::MAX
    } else {
        n as u8
    }
}

pub trait LasRGB {
    fn red(&self) -> u16;
    fn green(&self) -> u16;
    fn blue(&self) -> u16;

    fn set_red(&mut self, new_val: u16);
    fn set_green(&mut self, new_val: u16);
    fn set_blue(&mut self, new_val: u16);
}

#[derive(Default, Copy, Clone, Debug, PartialEq)]
pub struct RGB {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

impl LasRGB for RGB {
    fn red(&self) -> u16 {
        self.red
    }

    fn green(&self) -> u16 {
        self.green
    }

    fn blue(&self) -> u16 {
        self.blue
    }

    fn set_red(&mut self, new_val: u16) {
        self.red = new_val;
    }

    fn set_green(&mut self, new_val: u16) {
        self.green = new_val;
    }

    fn set_blue(&mut self, new_val: u16) {
        self.blue = new_val;
    }
}

impl RGB {
    pub const SIZE: usize = 6;

    fn color_diff_bits(&self, other: &RGB) -> u32 {
        (flag_diff(other.red, self.red, 0x00FF) as u32)
            | (flag_diff(other.red, self.red, 0xFF00) as u32) << 1
            | (flag_diff(other.green, self.green, 0x00FF) as u32) << 2
            | (flag_diff(other.green, self.green, 0xFF00) as u32) << 3
            | (flag_diff(other.blue, self.blue, 0x00FF) as u32) << 4
            | (flag_diff(other.blue, self.blue, 0xFF00) as u32) << 5
            | ((flag_diff(self.red, self.green, 0x00FF) as u32)
                | (flag_diff(self.red, self.blue, 0x00FF) as u32)
                | (flag_diff(self.red, self.green, 0xFF00) as u32)
                | (flag_diff(self.red, self.blue, 0xFF00) as u32))
                << 6
    }
}

impl Packable for RGB {
    fn unpack_from(input: &[u8]) -> Self {
        assert!(input.len() >= Self::SIZE, "RGB::unpack_from expected buffer of 6 bytes");
        unsafe { Self::unpack_from_unchecked(input) }
    }

    fn pack_into(&self, output: &mut [u8]) {
        assert!(output.len() >= Self::SIZE, "RGB::pack_into expected buffer of 6 bytes");
        unsafe { self.pack_into_unchecked(output) }
    }

    unsafe fn unpack_from_unchecked(input: &[u8]) -> Self {
        Self {
            red: u16::unpack_from_unchecked(input.get_unchecked(0..2)),
            green: u16::unpack_from_unchecked(input.get_unchecked(2..4)),
            blue: u16::unpack_from_unchecked(input.get_unchecked(4..6)),
        }
    }

    unsafe fn pack_into_unchecked(&self, output: &mut [u8]) {
        self.red.pack_into_unchecked(output.get_unchecked_mut(0..2));
        self.green.pack_into_unchecked(output.get_unchecked_mut(2..4));
        self.blue.pack_into_unchecked(output.get_unchecked_mut(4..6));
    }
}

/// Simpler codec used by LASzip version 1 streams: every channel's low/high
/// byte is diffed independently, with no red/green/blue correlation shortcut.
pub mod v1 {
    use std::io::{Read, Write};

    use crate::decoders::ArithmeticDecoder;
    use crate::encoders::ArithmeticEncoder;
    use crate::models::{ArithmeticModel, ArithmeticModelBuilder};
    use crate::packers::Packable;
    use crate::record::{FieldCompressor, FieldDecompressor};

    use super::RGB;

    fn channel_bits(this_val: &RGB, last: &RGB) -> u32 {
        ((this_val.red & 0x00FF != last.red & 0x00FF) as u32)
            | ((this_val.red >> 8 != last.red >> 8) as u32) << 1
            | ((this_val.green & 0x00FF != last.green & 0x00FF) as u32) << 2
            | ((this_val.green >> 8 != last.green >> 8) as u32) << 3
            | ((this_val.blue & 0x00FF != last.blue & 0x00FF) as u32) << 4
            | ((this_val.blue >> 8 != last.blue >> 8) as u32) << 5
    }

    pub struct LasRGBCompressor {
        have_last: bool,
        last: RGB,
        byte_used: ArithmeticModel,
        diffs: [ArithmeticModel; 6],
    }

    impl Default for LasRGBCompressor {
        fn default() -> Self {
            Self {
                have_last: false,
                last: RGB::default(),
                byte_used: ArithmeticModelBuilder::new(64).build(),
                diffs: [
                    ArithmeticModelBuilder::new(256).build(),
                    ArithmeticModelBuilder::new(256).build(),
                    ArithmeticModelBuilder::new(256).build(),
                    ArithmeticModelBuilder::new(256).build(),
                    ArithmeticModelBuilder::new(256).build(),
                    ArithmeticModelBuilder::new(256).build(),
                ],
            }
        }
    }

    impl<W: Write> FieldCompressor<W> for LasRGBCompressor {
        fn size_of_field(&self) -> usize {
            3 * std::mem::size_of::<u16>()
        }

        fn compress_first(&mut self, dst: &mut W, buf: &[u8]) -> std::io::Result<()> {
            self.last = RGB::unpack_from(buf);
            self.have_last = true;
            dst.write_all(buf)
        }

        fn compress_with(
            &mut self,
            encoder: &mut ArithmeticEncoder<W>,
            buf: &[u8],
        ) -> std::io::Result<()> {
            let this_val = RGB::unpack_from(buf);
            let sym = channel_bits(&this_val, &self.last);
            encoder.encode_symbol(&mut self.byte_used, sym)?;

            if is_nth_bit_set!(sym, 0) {
                let corr = (this_val.red & 0x00FF) as i32 - (self.last.red & 0x00FF) as i32;
                encoder.encode_symbol(&mut self.diffs[0], corr as u8 as u32)?;
            }
            if is_nth_bit_set!(sym, 1) {
                let corr = (this_val.red >> 8) as i32 - (self.last.red >> 8) as i32;
                encoder.encode_symbol(&mut self.diffs[1], corr as u8 as u32)?;
            }
            if is_nth_bit_set!(sym, 2) {
                let corr = (this_val.green & 0x00FF) as i32 - (self.last.green & 0x00FF) as i32;
                encoder.encode_symbol(&mut self.diffs[2], corr as u8 as u32)?;
            }
            if is_nth_bit_set!(sym, 3) {
                let corr = (this_val.green >> 8) as i32 - (self.last.green >> 8) as i32;
                encoder.encode_symbol(&mut self.diffs[3], corr as u8 as u32)?;
            }
            if is_nth_bit_set!(sym, 4) {
                let corr = (this_val.blue & 0x00FF) as i32 - (self.last.blue & 0x00FF) as i32;
                encoder.encode_symbol(&mut self.diffs[4], corr as u8 as u32)?;
            }
            if is_nth_bit_set!(sym, 5) {
                let corr = (this_val.blue >> 8) as i32 - (self.last.blue >> 8) as i32;
                encoder.encode_symbol(&mut self.diffs[5], corr as u8 as u32)?;
            }

            self.last = this_val;
            Ok(())
        }
    }

    pub struct LasRGBDecompressor {
        have_last: bool,
        last: RGB,
        byte_used: ArithmeticModel,
        diffs: [ArithmeticModel; 6],
    }

    impl Default for LasRGBDecompressor {
        fn default() -> Self {
            Self {
                have_last: false,
                last: RGB::default(),
                byte_used: ArithmeticModelBuilder::new(64).build(),
                diffs: [
                    ArithmeticModelBuilder::new(256).build(),
                    ArithmeticModelBuilder::new(256).build(),
                    ArithmeticModelBuilder::new(256).build(),
                    ArithmeticModelBuilder::new(256).build(),
                    ArithmeticModelBuilder::new(256).build(),
                    ArithmeticModelBuilder::new(256).build(),
                ],
            }
        }
    }

    impl<R: Read> FieldDecompressor<R> for LasRGBDecompressor {
        fn size_of_field(&self) -> usize {
            3 * std::mem::size_of::<u16>()
        }

        fn decompress_first(&mut self, src: &mut R, first_point: &mut [u8]) -> std::io::Result<()> {
            src.read_exact(first_point)?;
            self.last = RGB::unpack_from(first_point);
            self.have_last = true;
            Ok(())
        }

        fn decompress_with(
            &mut self,
            decoder: &mut ArithmeticDecoder<R>,
            buf: &mut [u8],
        ) -> std::io::Result<()> {
            let sym = decoder.decode_symbol(&mut self.byte_used)?;
            let mut this_val = self.last;

            if is_nth_bit_set!(sym, 0) {
                let corr = decoder.decode_symbol(&mut self.diffs[0])? as u8;
                this_val.red = (this_val.red & 0xFF00)
                    | corr.wrapping_add((self.last.red & 0x00FF) as u8) as u16;
            }
            if is_nth_bit_set!(sym, 1) {
                let corr = decoder.decode_symbol(&mut self.diffs[1])? as u8;
                this_val.red = (this_val.red & 0x00FF)
                    | ((corr.wrapping_add((self.last.red >> 8) as u8) as u16) << 8);
            }
            if is_nth_bit_set!(sym, 2) {
                let corr = decoder.decode_symbol(&mut self.diffs[2])? as u8;
                this_val.green = (this_val.green & 0xFF00)
                    | corr.wrapping_add((self.last.green & 0x00FF) as u8) as u16;
            }
            if is_nth_bit_set!(sym, 3) {
                let corr = decoder.decode_symbol(&mut self.diffs[3])? as u8;
                this_val.green = (this_val.green & 0x00FF)
                    | ((corr.wrapping_add((self.last.green >> 8) as u8) as u16) << 8);
            }
            if is_nth_bit_set!(sym, 4) {
                let corr = decoder.decode_symbol(&mut self.diffs[4])? as u8;
                this_val.blue = (this_val.blue & 0xFF00)
                    | corr.wrapping_add((self.last.blue & 0x00FF) as u8) as u16;
            }
            if is_nth_bit_set!(sym, 5) {
                let corr = decoder.decode_symbol(&mut self.diffs[5])? as u8;
                this_val.blue = (this_val.blue & 0x00FF)
                    | ((corr.wrapping_add((self.last.blue >> 8) as u8) as u16) << 8);
            }

            this_val.pack_into(buf);
            self.last = this_val;
            Ok(())
        }
    }
}

/// Correlated codec used from LASzip version 2 onwards: exploits the common
/// case of near-greyscale points by deriving green/blue corrections from the
/// red channel's diff instead of encoding them independently.
pub mod v2 {
    use std::io::{Read, Write};

    use crate::decoders::ArithmeticDecoder;
    use crate::encoders::ArithmeticEncoder;
    use crate::models::{ArithmeticModel, ArithmeticModelBuilder};
    use crate::packers::Packable;
    use crate::record::{FieldCompressor, FieldDecompressor};

    use super::{u8_clamp, RGB};

    pub struct LasRGBCompressor {
        have_last: bool,
        last: RGB,

        byte_used: ArithmeticModel,
        rgb_diff_0: ArithmeticModel,
        rgb_diff_1: ArithmeticModel,
        rgb_diff_2: ArithmeticModel,
        rgb_diff_3: ArithmeticModel,
        rgb_diff_4: ArithmeticModel,
        rgb_diff_5: ArithmeticModel,
    }

    impl Default for LasRGBCompressor {
        fn default() -> Self {
            Self {
                have_last: false,
                last: Default::default(),
                byte_used: ArithmeticModelBuilder::new(128).build(),
                rgb_diff_0: ArithmeticModelBuilder::new(256).build(),
                rgb_diff_1: ArithmeticModelBuilder::new(256).build(),
                rgb_diff_2: ArithmeticModelBuilder::new(256).build(),
                rgb_diff_3: ArithmeticModelBuilder::new(256).build(),
                rgb_diff_4: ArithmeticModelBuilder::new(256).build(),
                rgb_diff_5: ArithmeticModelBuilder::new(256).build(),
            }
        }
    }

    impl<W: Write> FieldCompressor<W> for LasRGBCompressor {
        fn size_of_field(&self) -> usize {
            3 * std::mem::size_of::<u16>()
        }

        fn compress_first(&mut self, dst: &mut W, buf: &[u8]) -> std::io::Result<()> {
            self.last = RGB::unpack_from(buf);
            self.have_last = true;
            dst.write_all(buf)
        }

        fn compress_with(
            &mut self,
            encoder: &mut ArithmeticEncoder<W>,
            buf: &[u8],
        ) -> std::io::Result<()> {
            let this_val = RGB::unpack_from(buf);

            let mut diff_l = 0i32;
            let mut diff_h = 0i32;
            let mut corr;

            let sym: u32 = this_val.color_diff_bits(&self.last);
            encoder.encode_symbol(&mut self.byte_used, sym)?;

            if (sym & (1 << 0)) != 0 {
                diff_l = (this_val.red & 0x00FF) as i32 - (self.last.red & 0x00FF) as i32;
                encoder.encode_symbol(&mut self.rgb_diff_0, diff_l as u8 as u32)?;
            }

            if (sym & (1 << 1)) != 0 {
                diff_h = (this_val.red >> 8) as i32 - (self.last.red >> 8) as i32;
                encoder.encode_symbol(&mut self.rgb_diff_1, diff_h as u8 as u32)?;
            }
            if (sym & (1 << 6)) != 0 {
                if (sym & (1 << 2)) != 0 {
                    corr = (this_val.green & 0x00FF) as i32
                        - u8_clamp(diff_l + (self.last.green & 0x00FF) as i32) as i32;
                    encoder.encode_symbol(&mut self.rgb_diff_2, corr as u8 as u32)?;
                }

                if (sym & (1 << 4)) != 0 {
                    diff_l = (diff_l + (this_val.green & 0x00FF) as i32
                        - (self.last.green & 0x00FF) as i32)
                        / 2;
                    corr = (this_val.blue & 0x00FF) as i32
                        - u8_clamp(diff_l + (self.last.blue & 0x00FF) as i32) as i32;
                    encoder.encode_symbol(&mut self.rgb_diff_4, corr as u8 as u32)?;
                }

                if (sym & (1 << 3)) != 0 {
                    corr = (this_val.green >> 8) as i32
                        - u8_clamp(diff_h + (self.last.green >> 8) as i32) as i32;
                    encoder.encode_symbol(&mut self.rgb_diff_3, corr as u8 as u32)?;
                }

                if (sym & (1 << 5)) != 0 {
                    diff_h = (diff_h + (this_val.green >> 8) as i32 - (self.last.green >> 8) as i32)
                        / 2;
                    corr = (this_val.blue >> 8) as i32
                        - u8_clamp(diff_h + (self.last.blue >> 8) as i32) as i32;
                    encoder.encode_symbol(&mut self.rgb_diff_5, corr as u8 as u32)?;
                }
            }
            self.last = this_val;
            Ok(())
        }
    }

    pub struct LasRGBDecompressor {
        have_last: bool,
        last: RGB,

        byte_used: ArithmeticModel,
        rgb_diff_0: ArithmeticModel,
        rgb_diff_1: ArithmeticModel,
        rgb_diff_2: ArithmeticModel,
        rgb_diff_3: ArithmeticModel,
        rgb_diff_4: ArithmeticModel,
        rgb_diff_5: ArithmeticModel,
    }

    impl Default for LasRGBDecompressor {
        fn default() -> Self {
            Self {
                have_last: false,
                last: Default::default(),
                byte_used: ArithmeticModelBuilder::new(128).build(),
                rgb_diff_0: ArithmeticModelBuilder::new(256).build(),
                rgb_diff_1: ArithmeticModelBuilder::new(256).build(),
                rgb_diff_2: ArithmeticModelBuilder::new(256).build(),
                rgb_diff_3: ArithmeticModelBuilder::new(256).build(),
                rgb_diff_4: ArithmeticModelBuilder::new(256).build(),
                rgb_diff_5: ArithmeticModelBuilder::new(256).build(),
            }
        }
    }

    impl<R: Read> FieldDecompressor<R> for LasRGBDecompressor {
        fn size_of_field(&self) -> usize {
            3 * std::mem::size_of::<u16>()
        }

        fn decompress_first(&mut self, src: &mut R, first_point: &mut [u8]) -> std::io::Result<()> {
            src.read_exact(first_point)?;
            self.last = RGB::unpack_from(first_point);
            self.have_last = true;
            Ok(())
        }

        fn decompress_with(
            &mut self,
            decoder: &mut ArithmeticDecoder<R>,
            buf: &mut [u8],
        ) -> std::io::Result<()> {
            let sym = decoder.decode_symbol(&mut self.byte_used)?;

            let mut this_val = RGB::default();
            let mut corr;
            let mut diff;

            if (sym & (1 << 0)) != 0 {
                corr = decoder.decode_symbol(&mut self.rgb_diff_0)? as u8;
                this_val.red = corr.wrapping_add((self.last.red & 0x00FF) as u8) as u16;
            } else {
                this_val.red = self.last.red & 0xFF;
            }

            if (sym & (1 << 1)) != 0 {
                corr = decoder.decode_symbol(&mut self.rgb_diff_1)? as u8;
                this_val.red |= (corr.wrapping_add((self.last.red >> 8) as u8) as u16) << 8;
            } else {
                this_val.red |= self.last.red & 0xFF00;
            }

            if (sym & (1 << 6)) != 0 {
                diff = (this_val.red & 0x00FF) as i32 - (self.last.red & 0x00FF) as i32;

                if (sym & (1 << 2)) != 0 {
                    corr = decoder.decode_symbol(&mut self.rgb_diff_2)? as u8;
                    this_val.green = corr
                        .wrapping_add(u8_clamp(diff + (self.last.green & 0x00FF) as i32) as u8)
                        as u16;
                } else {
                    this_val.green = self.last.green & 0x00FF;
                }

                if (sym & (1 << 4)) != 0 {
                    corr = decoder.decode_symbol(&mut self.rgb_diff_4)? as u8;
                    diff = (diff + (this_val.green & 0x00FF) as i32
                        - (self.last.green & 0x00FF) as i32)
                        / 2;
                    this_val.blue = corr
                        .wrapping_add(u8_clamp(diff + (self.last.blue & 0x00FF) as i32) as u8)
                        as u16;
                } else {
                    this_val.blue = self.last.blue & 0x00FF;
                }

                diff = (this_val.red >> 8) as i32 - (self.last.red >> 8) as i32;
                if (sym & (1 << 3)) != 0 {
                    corr = decoder.decode_symbol(&mut self.rgb_diff_3)? as u8;
                    this_val.green |= (corr
                        .wrapping_add(u8_clamp(diff + (self.last.green >> 8) as i32) as u8)
                        as u16)
                        << 8;
                } else {
                    this_val.green |= self.last.green & 0xFF00;
                }

                if (sym & (1 << 5)) != 0 {
                    corr = decoder.decode_symbol(&mut self.rgb_diff_5)? as u8;
                    diff = (diff + (this_val.green >> 8) as i32 - (self.last.green >> 8) as i32) / 2;
                    this_val.blue |= ((corr
                        .wrapping_add(u8_clamp(diff + (self.last.blue >> 8) as i32) as u8))
                        as u16)
                        << 8;
                } else {
                    this_val.blue |= self.last.blue & 0xFF00;
                }
            } else {
                this_val.green = this_val.red;
                this_val.blue = this_val.red;
            }
            this_val.pack_into(buf);
            self.last = this_val;
            Ok(())
        }
    }
}

/// Layered codec used from LASzip version 3 onwards, with per-scanner-channel
/// contexts so interleaved multi-channel scans do not pollute one another's
/// predictors.
pub mod v3 {
    use std::io::{Cursor, Read, Seek, Write};

    use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

    use crate::decoders::ArithmeticDecoder;
    use crate::encoders::ArithmeticEncoder;
    use crate::las::utils::{copy_bytes_into_decoder, copy_encoder_content_to};
    use crate::models::{ArithmeticModel, ArithmeticModelBuilder};
    use crate::packers::Packable;
    use crate::record::{LayeredFieldCompressor, LayeredFieldDecompressor};

    use super::{u8_clamp, RGB};

    struct RGBContext {
        byte_used: ArithmeticModel,
        rgb_diff_0: ArithmeticModel,
        rgb_diff_1: ArithmeticModel,
        rgb_diff_2: ArithmeticModel,
        rgb_diff_3: ArithmeticModel,
        rgb_diff_4: ArithmeticModel,
        rgb_diff_5: ArithmeticModel,
        unused: bool,
    }

    impl Default for RGBContext {
        fn default() -> Self {
            Self {
                byte_used: ArithmeticModelBuilder::new(128).build(),
                rgb_diff_0: ArithmeticModelBuilder::new(256).build(),
                rgb_diff_1: ArithmeticModelBuilder::new(256).build(),
                rgb_diff_2: ArithmeticModelBuilder::new(256).build(),
                rgb_diff_3: ArithmeticModelBuilder::new(256).build(),
                rgb_diff_4: ArithmeticModelBuilder::new(256).build(),
                rgb_diff_5: ArithmeticModelBuilder::new(256).build(),
                unused: false,
            }
        }
    }

    pub struct LasRGBDecompressor {
        decoder: ArithmeticDecoder<Cursor<Vec<u8>>>,
        changed_rgb: bool,
        layer_size: u32,
        last_context_used: usize,
        contexts: [RGBContext; 4],
        last_rgbs: [RGB; 4],
    }

    impl Default for LasRGBDecompressor {
        fn default() -> Self {
            Self {
                decoder: ArithmeticDecoder::new(Cursor::new(Vec::<u8>::new())),
                changed_rgb: false,
                layer_size: 0,
                last_context_used: 0,
                contexts: [
                    RGBContext::default(),
                    RGBContext::default(),
                    RGBContext::default(),
                    RGBContext::default(),
                ],
                last_rgbs: [RGB::default(); 4],
            }
        }
    }

    impl<R: Read + Seek> LayeredFieldDecompressor<R> for LasRGBDecompressor {
        fn size_of_field(&self) -> usize {
            3 * std::mem::size_of::<u16>()
        }

        fn init_first_point(
            &mut self,
            src: &mut R,
            first_point: &mut [u8],
            context: &mut usize,
        ) -> std::io::Result<()> {
            for ctx in &mut self.contexts {
                ctx.unused = true;
            }

            src.read_exact(first_point)?;
            self.last_rgbs[*context] = RGB::unpack_from(first_point);
            self.contexts[*context].unused = false;
            self.last_context_used = *context;
            Ok(())
        }

        fn decompress_field_with(
            &mut self,
            current_point: &mut [u8],
            context: &mut usize,
        ) -> std::io::Result<()> {
            if self.last_context_used != *context {
                self.last_context_used = *context;
                if self.contexts[*context].unused {
                    self.last_rgbs[*context] = self.last_rgbs[self.last_context_used];
                    self.contexts[*context].unused = false;
                    self.last_context_used = *context;
                }
            }

            let last = self.last_rgbs[self.last_context_used];
            let mut this_val = last;

            if self.changed_rgb {
                let the_context = &mut self.contexts[self.last_context_used];
                let sym = self.decoder.decode_symbol(&mut the_context.byte_used)?;

                let mut diff_l = 0i32;
                let mut diff_h = 0i32;

                if (sym & (1 << 0)) != 0 {
                    let corr = self.decoder.decode_symbol(&mut the_context.rgb_diff_0)? as u8;
                    this_val.red = corr.wrapping_add((last.red & 0x00FF) as u8) as u16;
                } else {
                    this_val.red = last.red & 0xFF;
                }

                if (sym & (1 << 1)) != 0 {
                    let corr = self.decoder.decode_symbol(&mut the_context.rgb_diff_1)? as u8;
                    this_val.red |= (corr.wrapping_add((last.red >> 8) as u8) as u16) << 8;
                } else {
                    this_val.red |= last.red & 0xFF00;
                }

                if (sym & (1 << 6)) != 0 {
                    diff_l = (this_val.red & 0x00FF) as i32 - (last.red & 0x00FF) as i32;

                    if (sym & (1 << 2)) != 0 {
                        let corr = self.decoder.decode_symbol(&mut the_context.rgb_diff_2)? as u8;
                        this_val.green = corr
                            .wrapping_add(u8_clamp(diff_l + (last.green & 0x00FF) as i32) as u8)
                            as u16;
                    } else {
                        this_val.green = last.green & 0x00FF;
                    }

                    if (sym & (1 << 4)) != 0 {
                        let corr = self.decoder.decode_symbol(&mut the_context.rgb_diff_4)? as u8;
                        diff_l = (diff_l + (this_val.green & 0x00FF) as i32
                            - (last.green & 0x00FF) as i32)
                            / 2;
                        this_val.blue = corr
                            .wrapping_add(u8_clamp(diff_l + (last.blue & 0x00FF) as i32) as u8)
                            as u16;
                    } else {
                        this_val.blue = last.blue & 0x00FF;
                    }

                    diff_h = (this_val.red >> 8) as i32 - (last.red >> 8) as i32;
                    if (sym & (1 << 3)) != 0 {
                        let corr = self.decoder.decode_symbol(&mut the_context.rgb_diff_3)? as u8;
                        this_val.green |= (corr
                            .wrapping_add(u8_clamp(diff_h + (last.green >> 8) as i32) as u8)
                            as u16)
                            << 8;
                    } else {
                        this_val.green |= last.green & 0xFF00;
                    }

                    if (sym & (1 << 5)) != 0 {
                        let corr = self.decoder.decode_symbol(&mut the_context.rgb_diff_5)? as u8;
                        diff_h = (diff_h + (this_val.green >> 8) as i32 - (last.green >> 8) as i32)
                            / 2;
                        this_val.blue |= ((corr
                            .wrapping_add(u8_clamp(diff_h + (last.blue >> 8) as i32) as u8))
                            as u16)
                            << 8;
                    } else {
                        this_val.blue |= last.blue & 0xFF00;
                    }
                } else {
                    this_val.green = this_val.red;
                    this_val.blue = this_val.red;
                }
            }

            self.last_rgbs[self.last_context_used] = this_val;
            this_val.pack_into(current_point);
            Ok(())
        }

        fn read_layers_sizes(&mut self, src: &mut R) -> std::io::Result<()> {
            self.layer_size = src.read_u32::<LittleEndian>()?;
            Ok(())
        }

        fn read_layers(&mut self, src: &mut R) -> std::io::Result<()> {
            self.changed_rgb = copy_bytes_into_decoder(
                true,
                self.layer_size as usize,
                &mut self.decoder,
                src,
            )?;
            Ok(())
        }
    }

    pub struct LasRGBCompressor {
        encoder: ArithmeticEncoder<Cursor<Vec<u8>>>,
        has_rgb_changed: bool,
        last_context_used: usize,
        contexts: Vec<RGBContext>,
        last_rgbs: [RGB; 4],
    }

    impl Default for LasRGBCompressor {
        fn default() -> Self {
            Self {
                encoder: ArithmeticEncoder::new(Cursor::new(Vec::<u8>::new())),
                has_rgb_changed: false,
                last_context_used: 0,
                contexts: vec![
                    RGBContext::default(),
                    RGBContext::default(),
                    RGBContext::default(),
                    RGBContext::default(),
                ],
                last_rgbs: [RGB::default(); 4],
            }
        }
    }

    impl<W: Write> LayeredFieldCompressor<W> for LasRGBCompressor {
        fn size_of_field(&self) -> usize {
            3 * std::mem::size_of::<u16>()
        }

        fn init_first_point(
            &mut self,
            dst: &mut W,
            first_point: &[u8],
            context: &mut usize,
        ) -> std::io::Result<()> {
            for ctx in &mut self.contexts {
                ctx.unused = true;
            }

            dst.write_all(first_point)?;
            self.last_rgbs[*context] = RGB::unpack_from(first_point);
            self.contexts[*context].unused = false;
            self.last_context_used = *context;
            Ok(())
        }

        fn compress_field_with(
            &mut self,
            current_point: &[u8],
            context: &mut usize,
        ) -> std::io::Result<()> {
            let this_val = RGB::unpack_from(current_point);

            if self.last_context_used != *context {
                if self.contexts[*context].unused {
                    self.last_rgbs[*context] = self.last_rgbs[self.last_context_used];
                    self.contexts[*context].unused = false;
                }
                self.last_context_used = *context;
            }

            let last = self.last_rgbs[self.last_context_used];

            if this_val != last {
                self.has_rgb_changed = true;
            }

            let sym = this_val.color_diff_bits(&last);
            let the_context = &mut self.contexts[self.last_context_used];
            self.encoder.encode_symbol(&mut the_context.byte_used, sym)?;

            let mut diff_l = 0i32;
            let mut diff_h = 0i32;
            let mut corr;

            if (sym & (1 << 0)) != 0 {
                diff_l = (this_val.red & 0x00FF) as i32 - (last.red & 0x00FF) as i32;
                self.encoder
                    .encode_symbol(&mut the_context.rgb_diff_0, diff_l as u8 as u32)?;
            }

            if (sym & (1 << 1)) != 0 {
                diff_h = (this_val.red >> 8) as i32 - (last.red >> 8) as i32;
                self.encoder
                    .encode_symbol(&mut the_context.rgb_diff_1, diff_h as u8 as u32)?;
            }

            if (sym & (1 << 6)) != 0 {
                if (sym & (1 << 2)) != 0 {
                    corr = (this_val.green & 0x00FF) as i32
                        - u8_clamp(diff_l + (last.green & 0x00FF) as i32) as i32;
                    self.encoder
                        .encode_symbol(&mut the_context.rgb_diff_2, corr as u8 as u32)?;
                }

                if (sym & (1 << 4)) != 0 {
                    diff_l = (diff_l + (this_val.green & 0x00FF) as i32
                        - (last.green & 0x00FF) as i32)
                        / 2;
                    corr = (this_val.blue & 0x00FF) as i32
                        - u8_clamp(diff_l + (last.blue & 0x00FF) as i32) as i32;
                    self.encoder
                        .encode_symbol(&mut the_context.rgb_diff_4, corr as u8 as u32)?;
                }

                if (sym & (1 << 3)) != 0 {
                    corr = (this_val.green >> 8) as i32
                        - u8_clamp(diff_h + (last.green >> 8) as i32) as i32;
                    self.encoder
                        .encode_symbol(&mut the_context.rgb_diff_3, corr as u8 as u32)?;
                }

                if (sym & (1 << 5)) != 0 {
                    diff_h = (diff_h + (this_val.green >> 8) as i32 - (last.green >> 8) as i32) / 2;
                    corr = (this_val.blue >> 8) as i32
                        - u8_clamp(diff_h + (last.blue >> 8) as i32) as i32;
                    self.encoder
                        .encode_symbol(&mut the_context.rgb_diff_5, corr as u8 as u32)?;
                }
            }

            self.last_rgbs[self.last_context_used] = this_val;
            Ok(())
        }

        fn write_layers_sizes(&mut self, dst: &mut W) -> std::io::Result<()> {
            self.encoder.done()?;
            dst.write_u32::<LittleEndian>(self.encoder.out_stream().get_ref().len() as u32)
        }

        fn write_layers(&mut self, dst: &mut W) -> std::io::Result<()> {
            copy_encoder_content_to(&mut self.encoder, dst)
        }
    }
}
