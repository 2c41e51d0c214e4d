#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bits::{BitReader, BitWriter};
use crate::error::{HeaderError, Result};

/// Profile fields shared by the general and sub-layer parts of profile_tier_level().
#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LayerProfile {
    pub profile_space: u8,
    pub tier_flag: bool,
    pub profile_idc: u8,
    pub profile_compatibility_flags: u32,
    pub progressive_source_flag: bool,
    pub interlaced_source_flag: bool,
    pub non_packed_constraint_flag: bool,
    pub frame_only_constraint_flag: bool,

    // Range extension constraint flags, zero for Main/Main10
    pub max_12bit_constraint_flag: bool,
    pub max_10bit_constraint_flag: bool,
    pub max_8bit_constraint_flag: bool,
    pub max_422chroma_constraint_flag: bool,
    pub max_420chroma_constraint_flag: bool,
    pub max_monochrome_constraint_flag: bool,
    pub intra_constraint_flag: bool,
    pub one_picture_only_constraint_flag: bool,
    pub lower_bit_rate_constraint_flag: bool,

    pub inbld_flag: bool,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SubLayerPtl {
    pub profile_present_flag: bool,
    pub level_present_flag: bool,
    pub profile: LayerProfile,
    pub level_idc: u8,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProfileTierLevel {
    pub general: LayerProfile,
    pub general_level_idc: u8,

    /// One entry per sub-layer below the highest, `max_sub_layers_minus1` in total.
    pub sub_layers: Vec<SubLayerPtl>,
}

impl LayerProfile {
    fn write(&self, writer: &mut BitWriter) {
        writer.put_bits(2, self.profile_space as u32);
        writer.put_bit(self.tier_flag);
        writer.put_bits(5, self.profile_idc as u32);
        writer.put_bits(32, self.profile_compatibility_flags);

        writer.put_bit(self.progressive_source_flag);
        writer.put_bit(self.interlaced_source_flag);
        writer.put_bit(self.non_packed_constraint_flag);
        writer.put_bit(self.frame_only_constraint_flag);

        writer.put_bit(self.max_12bit_constraint_flag);
        writer.put_bit(self.max_10bit_constraint_flag);
        writer.put_bit(self.max_8bit_constraint_flag);
        writer.put_bit(self.max_422chroma_constraint_flag);
        writer.put_bit(self.max_420chroma_constraint_flag);
        writer.put_bit(self.max_monochrome_constraint_flag);
        writer.put_bit(self.intra_constraint_flag);
        writer.put_bit(self.one_picture_only_constraint_flag);
        writer.put_bit(self.lower_bit_rate_constraint_flag);

        // reserved_zero_34bits
        writer.put_bits(32, 0);
        writer.put_bits(2, 0);

        writer.put_bit(self.inbld_flag);
    }

    fn parse(reader: &mut BitReader) -> Result<Self> {
        let mut profile = LayerProfile {
            profile_space: reader.get_n(2)?,
            tier_flag: reader.get_bit()?,
            profile_idc: reader.get_n(5)?,
            profile_compatibility_flags: reader.get_bits(32)?,
            progressive_source_flag: reader.get_bit()?,
            interlaced_source_flag: reader.get_bit()?,
            non_packed_constraint_flag: reader.get_bit()?,
            frame_only_constraint_flag: reader.get_bit()?,
            ..Default::default()
        };

        profile.max_12bit_constraint_flag = reader.get_bit()?;
        profile.max_10bit_constraint_flag = reader.get_bit()?;
        profile.max_8bit_constraint_flag = reader.get_bit()?;
        profile.max_422chroma_constraint_flag = reader.get_bit()?;
        profile.max_420chroma_constraint_flag = reader.get_bit()?;
        profile.max_monochrome_constraint_flag = reader.get_bit()?;
        profile.intra_constraint_flag = reader.get_bit()?;
        profile.one_picture_only_constraint_flag = reader.get_bit()?;
        profile.lower_bit_rate_constraint_flag = reader.get_bit()?;

        if reader.get_bits(32)? != 0 || reader.get_bits(2)? != 0 {
            return Err(HeaderError::Unsupported("reserved profile constraint bits set"));
        }

        profile.inbld_flag = reader.get_bit()?;

        Ok(profile)
    }
}

impl ProfileTierLevel {
    /// profile_tier_level(1, max_sub_layers_minus1)
    pub fn write(&self, writer: &mut BitWriter, max_sub_layers_minus1: u8) {
        let default = SubLayerPtl::default();
        let sub_layers: Vec<&SubLayerPtl> = (0..max_sub_layers_minus1 as usize)
            .map(|i| self.sub_layers.get(i).unwrap_or(&default))
            .collect();

        self.general.write(writer);
        writer.put_bits(8, self.general_level_idc as u32);

        for sl in &sub_layers {
            writer.put_bit(sl.profile_present_flag);
            writer.put_bit(sl.level_present_flag);
        }

        if max_sub_layers_minus1 > 0 {
            for _ in max_sub_layers_minus1..8 {
                writer.put_bits(2, 0); // reserved_zero_2bits
            }
        }

        for sl in sub_layers {
            if sl.profile_present_flag {
                sl.profile.write(writer);
            }

            if sl.level_present_flag {
                writer.put_bits(8, sl.level_idc as u32);
            }
        }
    }

    pub fn parse(reader: &mut BitReader, max_sub_layers_minus1: u8) -> Result<Self> {
        let general = LayerProfile::parse(reader)?;
        let general_level_idc = reader.get_n(8)?;

        let mut sub_layers: Vec<SubLayerPtl> = (0..max_sub_layers_minus1)
            .map(|_| -> Result<SubLayerPtl> {
                Ok(SubLayerPtl {
                    profile_present_flag: reader.get_bit()?,
                    level_present_flag: reader.get_bit()?,
                    ..Default::default()
                })
            })
            .collect::<Result<_>>()?;

        if max_sub_layers_minus1 > 0 {
            for _ in max_sub_layers_minus1..8 {
                if reader.get_bits(2)? != 0 {
                    return Err(HeaderError::InvalidParam("reserved_zero_2bits not zero"));
                }
            }
        }

        for sl in sub_layers.iter_mut() {
            if sl.profile_present_flag {
                sl.profile = LayerProfile::parse(reader)?;
            }

            if sl.level_present_flag {
                sl.level_idc = reader.get_n(8)?;
            }
        }

        Ok(Self {
            general,
            general_level_idc,
            sub_layers,
        })
    }
}
