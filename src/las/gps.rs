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

use crate::packers::Packable;

const LASZIP_GPS_TIME_MULTI: i32 = 500;
const LASZIP_GPS_TIME_MULTI_MINUS: i32 = -10;
const LASZIP_GPS_TIME_MULTI_UNCHANGED: i32 =
    (LASZIP_GPS_TIME_MULTI - LASZIP_GPS_TIME_MULTI_MINUS + 1);
const LASZIP_GPS_TIME_MULTI_CODE_FULL: i32 =
    (LASZIP_GPS_TIME_MULTI - LASZIP_GPS_TIME_MULTI_MINUS + 2);
const LASZIP_GPS_TIME_MULTI_TOTAL: i32 = (LASZIP_GPS_TIME_MULTI - LASZIP_GPS_TIME_MULTI_MINUS + 6);

#[inline]
fn i32_quantize(n: f32) -> i32 {
    if n >= 0.0f32 {
        (n + 0.5f32) as i32
    } else {
        (n - 0.5f32) as i32
    }
}

pub trait LasGpsTime {
    fn gps_time(&self) -> f64;
    fn set_gps_time(&mut self, new_value: f64);
}

#[derive(Default, Copy, Clone, Debug, PartialEq)]
pub struct GpsTime {
    pub value: i64,
}

impl Packable for GpsTime {
    fn unpack_from(input: &[u8]) -> Self {
        let lower = u32::unpack_from(&input[0..std::mem::size_of::<u32>()]);
        let upper = u32::unpack_from(
            &input[std::mem::size_of::<u32>()..(2 * std::mem::size_of::<u32>())],
        );

        GpsTime {
            value: (upper as i64) << 32 | lower as i64,
        }
    }

    fn pack_into(&self, output: &mut [u8]) {
        ((self.value & 0xFFFFFFFF) as u32)
            .pack_into(&mut output[0..std::mem::size_of::<u32>()]);
        ((self.value >> 32) as u32).pack_into(
            &mut output[std::mem::size_of::<u32>()..(2 * std::mem::size_of::<u32>())],
        );
    }

    unsafe fn unpack_from_unchecked(input: &[u8]) -> Self {
        Self::unpack_from(input)
    }

    unsafe fn pack_into_unchecked(&self, output: &mut [u8]) {
        self.pack_into(output)
    }
}

/// Simple, single time-sequence codec used by LASzip version 1 streams.
pub mod v1 {
    use std::io::{Read, Write};

    use crate::compressors::{IntegerCompressor, IntegerCompressorBuilder};
    use crate::decoders::ArithmeticDecoder;
    use crate::decompressors::{IntegerDecompressor, IntegerDecompressorBuilder};
    use crate::encoders::ArithmeticEncoder;
    use crate::models::{ArithmeticBitModel, ArithmeticModel, ArithmeticModelBuilder};
    use crate::packers::Packable;
    use crate::record::{FieldCompressor, FieldDecompressor};

    use super::GpsTime;

    pub struct LasGpsTimeCompressor {
        have_last: bool,
        last_gps_time: GpsTime,
        last_gps_time_diff: i32,
        gps_time_change: ArithmeticBitModel,
        gps_time_0_diff: ArithmeticModel,
        ic_gps_time: IntegerCompressor,
    }

    impl Default for LasGpsTimeCompressor {
        fn default() -> Self {
            Self {
                have_last: false,
                last_gps_time: GpsTime::default(),
                last_gps_time_diff: 0,
                gps_time_change: ArithmeticBitModel::new(),
                gps_time_0_diff: ArithmeticModelBuilder::new(3).build(),
                ic_gps_time: IntegerCompressorBuilder::new().bits(32).contexts(6).build(),
            }
        }
    }

    impl<W: Write> FieldCompressor<W> for LasGpsTimeCompressor {
        fn size_of_field(&self) -> usize {
            std::mem::size_of::<i64>()
        }

        fn compress_first(&mut self, dst: &mut W, buf: &[u8]) -> std::io::Result<()> {
            self.last_gps_time = GpsTime::unpack_from(buf);
            self.last_gps_time_diff = 0;
            self.have_last = true;
            self.ic_gps_time.init();
            dst.write_all(buf)
        }

        fn compress_with(
            &mut self,
            encoder: &mut ArithmeticEncoder<W>,
            buf: &[u8],
        ) -> std::io::Result<()> {
            let this_val = GpsTime::unpack_from(buf);

            if self.last_gps_time_diff == 0 {
                if this_val.value == self.last_gps_time.value {
                    encoder.encode_symbol(&mut self.gps_time_0_diff, 0)?;
                } else {
                    let curr_gps_time_diff_64 = this_val.value - self.last_gps_time.value;
                    let curr_gps_time_diff_32 = curr_gps_time_diff_64 as i32;

                    if curr_gps_time_diff_64 == curr_gps_time_diff_32 as i64 {
                        encoder.encode_symbol(&mut self.gps_time_0_diff, 1)?;
                        self.ic_gps_time
                            .compress(encoder, 0, curr_gps_time_diff_32, 0)?;
                        self.last_gps_time_diff = curr_gps_time_diff_32;
                    } else {
                        encoder.encode_symbol(&mut self.gps_time_0_diff, 2)?;
                        self.ic_gps_time.compress(
                            encoder,
                            (self.last_gps_time.value >> 32) as i32,
                            (this_val.value >> 32) as i32,
                            8,
                        )?;
                        encoder.write_int(this_val.value as u32)?;
                        self.last_gps_time_diff = 0;
                    }
                }
            } else {
                let curr_gps_time_diff_64 = this_val.value - self.last_gps_time.value;
                let curr_gps_time_diff_32 = curr_gps_time_diff_64 as i32;

                if curr_gps_time_diff_64 == curr_gps_time_diff_32 as i64 {
                    encoder.encode_bit(&mut self.gps_time_change, 0)?;
                    self.ic_gps_time.compress(
                        encoder,
                        self.last_gps_time_diff,
                        curr_gps_time_diff_32,
                        1,
                    )?;
                    self.last_gps_time_diff = curr_gps_time_diff_32;
                } else {
                    encoder.encode_bit(&mut self.gps_time_change, 1)?;
                    self.ic_gps_time.compress(
                        encoder,
                        (self.last_gps_time.value >> 32) as i32,
                        (this_val.value >> 32) as i32,
                        8,
                    )?;
                    encoder.write_int(this_val.value as u32)?;
                    self.last_gps_time_diff = 0;
                }
            }
            self.last_gps_time = this_val;
            Ok(())
        }
    }

    pub struct LasGpsTimeDecompressor {
        have_last: bool,
        last_gps_time: GpsTime,
        last_gps_time_diff: i32,
        gps_time_change: ArithmeticBitModel,
        gps_time_0_diff: ArithmeticModel,
        ic_gps_time: IntegerDecompressor,
    }

    impl Default for LasGpsTimeDecompressor {
        fn default() -> Self {
            Self {
                have_last: false,
                last_gps_time: GpsTime::default(),
                last_gps_time_diff: 0,
                gps_time_change: ArithmeticBitModel::new(),
                gps_time_0_diff: ArithmeticModelBuilder::new(3).build(),
                ic_gps_time: IntegerDecompressorBuilder::new()
                    .bits(32)
                    .contexts(6)
                    .build(),
            }
        }
    }

    impl<R: Read> FieldDecompressor<R> for LasGpsTimeDecompressor {
        fn size_of_field(&self) -> usize {
            std::mem::size_of::<i64>()
        }

        fn decompress_first(&mut self, src: &mut R, first_point: &mut [u8]) -> std::io::Result<()> {
            src.read_exact(first_point)?;
            self.last_gps_time = GpsTime::unpack_from(first_point);
            self.last_gps_time_diff = 0;
            self.have_last = true;
            self.ic_gps_time.init();
            Ok(())
        }

        fn decompress_with(
            &mut self,
            decoder: &mut ArithmeticDecoder<R>,
            buf: &mut [u8],
        ) -> std::io::Result<()> {
            if self.last_gps_time_diff == 0 {
                let multi = decoder.decode_symbol(&mut self.gps_time_0_diff)?;
                if multi == 1 {
                    self.last_gps_time_diff = self.ic_gps_time.decompress(decoder, 0, 0)?;
                    self.last_gps_time.value += self.last_gps_time_diff as i64;
                } else if multi == 2 {
                    let upper =
                        self.ic_gps_time
                            .decompress(decoder, (self.last_gps_time.value >> 32) as i32, 8)?
                            as i64;
                    self.last_gps_time.value = (upper << 32) | decoder.read_int()? as i64;
                    self.last_gps_time_diff = 0;
                }
            } else {
                let changed = decoder.decode_bit(&mut self.gps_time_change)?;
                if changed == 0 {
                    self.last_gps_time_diff = self.ic_gps_time.decompress(
                        decoder,
                        self.last_gps_time_diff,
                        1,
                    )?;
                    self.last_gps_time.value += self.last_gps_time_diff as i64;
                } else {
                    let upper =
                        self.ic_gps_time
                            .decompress(decoder, (self.last_gps_time.value >> 32) as i32, 8)?
                            as i64;
                    self.last_gps_time.value = (upper << 32) | decoder.read_int()? as i64;
                    self.last_gps_time_diff = 0;
                }
            }
            self.last_gps_time.pack_into(buf);
            Ok(())
        }
    }
}

/// Four concurrent time-sequence codec used from LASzip version 2 onwards.
pub mod v2 {
    use std::io::{Read, Write};

    use crate::compressors::{IntegerCompressor, IntegerCompressorBuilder};
    use crate::decoders::ArithmeticDecoder;
    use crate::decompressors::{IntegerDecompressor, IntegerDecompressorBuilder};
    use crate::encoders::ArithmeticEncoder;
    use crate::models::{ArithmeticModel, ArithmeticModelBuilder};
    use crate::packers::Packable;
    use crate::record::{FieldCompressor, FieldDecompressor};

    use super::{
        i32_quantize, GpsTime, LASZIP_GPS_TIME_MULTI, LASZIP_GPS_TIME_MULTI_CODE_FULL,
        LASZIP_GPS_TIME_MULTI_MINUS, LASZIP_GPS_TIME_MULTI_UNCHANGED,
    };

    struct Common {
        have_last: bool,
        gps_time_multi: ArithmeticModel,
        gps_time_0_diff: ArithmeticModel,
        last: usize,
        next: usize,
        last_gps_times: [GpsTime; 4],
        last_gps_time_diffs: [i32; 4],
        multi_extreme_counters: [i32; 4],
    }

    impl Common {
        fn new() -> Self {
            Self {
                have_last: false,
                gps_time_multi: ArithmeticModelBuilder::new(LASZIP_GPS_TIME_MULTI as u32).build(),
                gps_time_0_diff: ArithmeticModelBuilder::new(6).build(),
                last: 0,
                next: 0,
                last_gps_times: [GpsTime::default(); 4],
                last_gps_time_diffs: [0i32; 4],
                multi_extreme_counters: [0i32; 4],
            }
        }
    }

    pub struct GpsTimeCompressor {
        ic_gps_time: IntegerCompressor,
        compressor_inited: bool,
        common: Common,
    }

    impl Default for GpsTimeCompressor {
        fn default() -> Self {
            Self {
                ic_gps_time: IntegerCompressorBuilder::new().bits(32).contexts(9).build(),
                compressor_inited: false,
                common: Common::new(),
            }
        }
    }

    impl<W: Write> FieldCompressor<W> for GpsTimeCompressor {
        fn size_of_field(&self) -> usize {
            std::mem::size_of::<i64>()
        }

        fn compress_first(&mut self, dst: &mut W, buf: &[u8]) -> std::io::Result<()> {
            if !self.compressor_inited {
                self.ic_gps_time.init();
                self.compressor_inited = true;
            }
            self.common.have_last = true;
            self.common.last_gps_times[0] = GpsTime::unpack_from(buf);
            dst.write_all(buf)
        }

        fn compress_with(
            &mut self,
            encoder: &mut ArithmeticEncoder<W>,
            buf: &[u8],
        ) -> std::io::Result<()> {
            let this_val = GpsTime::unpack_from(buf);

            if !self.compressor_inited {
                self.ic_gps_time.init();
                self.compressor_inited = true;
            }

            if self.common.last_gps_time_diffs[self.common.last] == 0 {
                if this_val.value == self.common.last_gps_times[self.common.last].value {
                    encoder.encode_symbol(&mut self.common.gps_time_0_diff, 0)?;
                } else {
                    let curr_gps_time_diff_64 =
                        this_val.value - self.common.last_gps_times[self.common.last].value;
                    let curr_gps_time_diff_32 = curr_gps_time_diff_64 as i32;

                    if curr_gps_time_diff_64 == curr_gps_time_diff_32 as i64 {
                        encoder.encode_symbol(&mut self.common.gps_time_0_diff, 1)?;
                        self.ic_gps_time
                            .compress(encoder, 0, curr_gps_time_diff_32, 0)?;
                        self.common.last_gps_time_diffs[self.common.last] = curr_gps_time_diff_32;
                        self.common.multi_extreme_counters[self.common.last] = 0;
                    } else {
                        let mut found = false;
                        for i in 1..4 {
                            let other_gps_time_diff_64 = this_val.value
                                - self.common.last_gps_times[((self.common.last + i) & 3)].value;
                            let other_gps_time_diff_32 = other_gps_time_diff_64 as i32;

                            if other_gps_time_diff_64 == other_gps_time_diff_32 as i64 {
                                encoder
                                    .encode_symbol(&mut self.common.gps_time_0_diff, i as u32 + 2)?;
                                self.common.last = (self.common.last + i) & 3;
                                found = true;
                                break;
                            }
                        }
                        if found {
                            // the value belongs to one of the other sequences: re-dispatch
                            // using that sequence's state instead of the one we started with.
                            return self.compress_with(encoder, buf);
                        }
                        encoder.encode_symbol(&mut self.common.gps_time_0_diff, 2)?;
                        self.ic_gps_time.compress(
                            encoder,
                            (self.common.last_gps_times[self.common.last].value >> 32) as i32,
                            (this_val.value >> 32) as i32,
                            8,
                        )?;
                        encoder.write_int(this_val.value as u32)?;

                        self.common.next = (self.common.next + 1) & 3;
                        self.common.last = self.common.next;
                        self.common.last_gps_time_diffs[self.common.last] = 0;
                        self.common.multi_extreme_counters[self.common.last] = 0;
                        self.common.last_gps_times[self.common.last] = this_val;
                        return Ok(());
                    }
                }
            } else {
                let curr_gps_time_diff_64 =
                    this_val.value - self.common.last_gps_times[self.common.last].value;
                let curr_gps_time_diff_32 = curr_gps_time_diff_64 as i32;

                if curr_gps_time_diff_64 == curr_gps_time_diff_32 as i64 {
                    let multi_f = curr_gps_time_diff_32 as f32
                        / self.common.last_gps_time_diffs[self.common.last] as f32;
                    let multi = i32_quantize(multi_f);

                    if multi == 1 {
                        encoder.encode_symbol(&mut self.common.gps_time_multi, 1)?;
                        self.ic_gps_time.compress(
                            encoder,
                            self.common.last_gps_time_diffs[self.common.last],
                            curr_gps_time_diff_32,
                            1,
                        )?;
                        self.common.multi_extreme_counters[self.common.last] = 0;
                    } else if multi > 0 {
                        if multi < LASZIP_GPS_TIME_MULTI {
                            encoder.encode_symbol(&mut self.common.gps_time_multi, multi as u32)?;
                            let context = if multi < 10 { 2u32 } else { 3u32 };
                            self.ic_gps_time.compress(
                                encoder,
                                multi * self.common.last_gps_time_diffs[self.common.last],
                                curr_gps_time_diff_32,
                                context,
                            )?;
                        } else {
                            encoder.encode_symbol(
                                &mut self.common.gps_time_multi,
                                LASZIP_GPS_TIME_MULTI as u32,
                            )?;
                            self.ic_gps_time.compress(
                                encoder,
                                LASZIP_GPS_TIME_MULTI
                                    * self.common.last_gps_time_diffs[self.common.last],
                                curr_gps_time_diff_32,
                                3,
                            )?;
                        }
                    } else if multi < 0 {
                        if multi > LASZIP_GPS_TIME_MULTI_MINUS {
                            encoder.encode_symbol(
                                &mut self.common.gps_time_multi,
                                (LASZIP_GPS_TIME_MULTI - multi) as u32,
                            )?;
                            self.ic_gps_time.compress(
                                encoder,
                                multi * self.common.last_gps_time_diffs[self.common.last],
                                curr_gps_time_diff_32,
                                5,
                            )?;
                        } else {
                            encoder.encode_symbol(
                                &mut self.common.gps_time_multi,
                                (LASZIP_GPS_TIME_MULTI - LASZIP_GPS_TIME_MULTI_MINUS) as u32,
                            )?;
                            self.ic_gps_time.compress(
                                encoder,
                                LASZIP_GPS_TIME_MULTI_MINUS
                                    * self.common.last_gps_time_diffs[self.common.last],
                                curr_gps_time_diff_32,
                                6,
                            )?;
                            self.common.multi_extreme_counters[self.common.last] += 1;
                            if self.common.multi_extreme_counters[self.common.last] > 3 {
                                self.common.last_gps_time_diffs[self.common.last] =
                                    curr_gps_time_diff_32;
                                self.common.multi_extreme_counters[self.common.last] = 0;
                            }
                        }
                    } else {
                        encoder.encode_symbol(&mut self.common.gps_time_multi, 0)?;
                        self.ic_gps_time
                            .compress(encoder, 7, curr_gps_time_diff_32, 7)?;
                        self.common.multi_extreme_counters[self.common.last] += 1;
                        if self.common.multi_extreme_counters[self.common.last] > 3 {
                            self.common.last_gps_time_diffs[self.common.last] =
                                curr_gps_time_diff_32;
                            self.common.multi_extreme_counters[self.common.last] = 0;
                        }
                    }
                } else {
                    let mut found = false;
                    for i in 1..4 {
                        let other_gps_time_diff_64 = this_val.value
                            - self.common.last_gps_times[((self.common.last + i) & 3)].value;
                        let other_gps_time_diff_32 = other_gps_time_diff_64 as i32;

                        if other_gps_time_diff_64 == other_gps_time_diff_32 as i64 {
                            encoder.encode_symbol(
                                &mut self.common.gps_time_multi,
                                (LASZIP_GPS_TIME_MULTI_CODE_FULL + i as i32) as u32,
                            )?;
                            self.common.last = (self.common.last + i) & 3;
                            found = true;
                            break;
                        }
                    }

                    if found {
                        return self.compress_with(encoder, buf);
                    }
                    encoder.encode_symbol(
                        &mut self.common.gps_time_multi,
                        LASZIP_GPS_TIME_MULTI_CODE_FULL as u32,
                    )?;
                    self.ic_gps_time.compress(
                        encoder,
                        (self.common.last_gps_times[self.common.last].value >> 32) as i32,
                        (this_val.value >> 32) as i32,
                        8,
                    )?;
                    encoder.write_int(this_val.value as u32)?;
                    self.common.next = (self.common.next + 1) & 3;
                    self.common.last = self.common.next;
                    self.common.last_gps_time_diffs[self.common.last] = 0;
                    self.common.multi_extreme_counters[self.common.last] = 0;
                }
                self.common.last_gps_times[self.common.last] = this_val;
            }
            Ok(())
        }
    }

    pub struct GpsTimeDecompressor {
        common: Common,
        decompressor_inited: bool,
        ic_gps_time: IntegerDecompressor,
    }

    impl Default for GpsTimeDecompressor {
        fn default() -> Self {
            Self {
                common: Common::new(),
                decompressor_inited: false,
                ic_gps_time: IntegerDecompressorBuilder::new()
                    .bits(32)
                    .contexts(9)
                    .build(),
            }
        }
    }

    impl<R: Read> FieldDecompressor<R> for GpsTimeDecompressor {
        fn size_of_field(&self) -> usize {
            std::mem::size_of::<i64>()
        }

        fn decompress_first(&mut self, src: &mut R, first_point: &mut [u8]) -> std::io::Result<()> {
            if !self.decompressor_inited {
                self.ic_gps_time.init();
                self.decompressor_inited = true;
            }
            src.read_exact(first_point)?;
            self.common.last_gps_times[0] = GpsTime::unpack_from(first_point);
            self.common.have_last = true;
            Ok(())
        }

        fn decompress_with(
            &mut self,
            decoder: &mut ArithmeticDecoder<R>,
            buf: &mut [u8],
        ) -> std::io::Result<()> {
            if !self.decompressor_inited {
                self.ic_gps_time.init();
                self.decompressor_inited = true;
            }

            let mut multi: i32;
            loop {
                if self.common.last_gps_time_diffs[self.common.last] == 0 {
                    multi = decoder.decode_symbol(&mut self.common.gps_time_0_diff)? as i32;

                    if multi == 1 {
                        self.common.last_gps_time_diffs[self.common.last] =
                            self.ic_gps_time.decompress(decoder, 0, 0)?;
                        self.common.last_gps_times[self.common.last].value +=
                            self.common.last_gps_time_diffs[self.common.last] as i64;
                        self.common.multi_extreme_counters[self.common.last] = 0;
                        break;
                    } else if multi == 2 {
                        self.common.next = (self.common.next + 1) & 3;
                        let upper = self.ic_gps_time.decompress(
                            decoder,
                            (self.common.last_gps_times[self.common.last].value >> 32) as i32,
                            8,
                        )? as i64;
                        self.common.last_gps_times[self.common.next].value =
                            (upper << 32) | decoder.read_int()? as i64;
                        self.common.last = self.common.next;
                        self.common.last_gps_time_diffs[self.common.last] = 0;
                        self.common.multi_extreme_counters[self.common.last] = 0;
                        break;
                    } else if multi > 2 {
                        self.common.last = (self.common.last + multi as usize - 2) & 3;
                        continue;
                    }
                    break;
                } else {
                    multi = decoder.decode_symbol(&mut self.common.gps_time_multi)? as i32;

                    if multi == 1 {
                        self.common.last_gps_times[self.common.last].value += self
                            .ic_gps_time
                            .decompress(decoder, self.common.last_gps_time_diffs[self.common.last], 1)?
                            as i64;
                        self.common.multi_extreme_counters[self.common.last] = 0;
                        break;
                    } else if multi < LASZIP_GPS_TIME_MULTI_UNCHANGED {
                        let mut m = multi;
                        let gps_time_diff: i32;
                        if m == 0 {
                            gps_time_diff = self.ic_gps_time.decompress(decoder, 0, 7)?;
                            self.common.multi_extreme_counters[self.common.last] += 1;
                            if self.common.multi_extreme_counters[self.common.last] > 3 {
                                self.common.last_gps_time_diffs[self.common.last] = gps_time_diff;
                                self.common.multi_extreme_counters[self.common.last] = 0;
                            }
                        } else if m < LASZIP_GPS_TIME_MULTI {
                            let context = if m < 10 { 2u32 } else { 3u32 };
                            gps_time_diff = self.ic_gps_time.decompress(
                                decoder,
                                m * self.common.last_gps_time_diffs[self.common.last],
                                context,
                            )?;
                        } else if m == LASZIP_GPS_TIME_MULTI {
                            gps_time_diff = self.ic_gps_time.decompress(
                                decoder,
                                m * self.common.last_gps_time_diffs[self.common.last],
                                4,
                            )?;
                            self.common.multi_extreme_counters[self.common.last] += 1;
                            if self.common.multi_extreme_counters[self.common.last] > 3 {
                                self.common.last_gps_time_diffs[self.common.last] = gps_time_diff;
                                self.common.multi_extreme_counters[self.common.last] = 0;
                            }
                        } else {
                            m = LASZIP_GPS_TIME_MULTI - m;
                            if m > LASZIP_GPS_TIME_MULTI_MINUS {
                                gps_time_diff = self.ic_gps_time.decompress(
                                    decoder,
                                    m * self.common.last_gps_time_diffs[self.common.last],
                                    5,
                                )?;
                            } else {
                                gps_time_diff = self.ic_gps_time.decompress(
                                    decoder,
                                    LASZIP_GPS_TIME_MULTI_MINUS
                                        * self.common.last_gps_time_diffs[self.common.last],
                                    6,
                                )?;
                                self.common.multi_extreme_counters[self.common.last] += 1;
                                if self.common.multi_extreme_counters[self.common.last] > 3 {
                                    self.common.last_gps_time_diffs[self.common.last] =
                                        gps_time_diff;
                                    self.common.multi_extreme_counters[self.common.last] = 0;
                                }
                            }
                        }
                        self.common.last_gps_times[self.common.last].value += gps_time_diff as i64;
                        break;
                    } else if multi == LASZIP_GPS_TIME_MULTI_CODE_FULL {
                        self.common.next = (self.common.next + 1) & 3;
                        let upper = self.ic_gps_time.decompress(
                            decoder,
                            (self.common.last_gps_times[self.common.last].value >> 32) as i32,
                            8,
                        )? as i64;
                        self.common.last_gps_times[self.common.next].value =
                            (upper << 32) | decoder.read_int()? as i64;
                        self.common.last = self.common.next;
                        self.common.last_gps_time_diffs[self.common.last] = 0;
                        self.common.multi_extreme_counters[self.common.last] = 0;
                        break;
                    } else if multi > LASZIP_GPS_TIME_MULTI_CODE_FULL {
                        self.common.last = (self.common.last + multi as usize
                            - LASZIP_GPS_TIME_MULTI_CODE_FULL as usize)
                            & 3;
                        continue;
                    }
                    break;
                }
            }
            self.common.last_gps_times[self.common.last].pack_into(buf);
            Ok(())
        }
    }
}
