//! Recording settings
//!
//! Value types describing how the encoder should compress each track, plus
//! the fixed lookup from codec to container type.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Video codecs understood by the encoder
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VideoCodec {
    H264,
    Hevc,
    HevcWithAlpha,
    ProRes422,
    ProRes422HQ,
    ProRes422LT,
    ProRes422Proxy,
    ProRes4444,
    Jpeg,
    /// A codec this crate has no container mapping for
    Other(String),
}

impl VideoCodec {
    /// Identifier passed to the encoder
    pub fn as_str(&self) -> &str {
        match self {
            VideoCodec::H264 => "avc1",
            VideoCodec::Hevc => "hvc1",
            VideoCodec::HevcWithAlpha => "muxa",
            VideoCodec::ProRes422 => "apcn",
            VideoCodec::ProRes422HQ => "apch",
            VideoCodec::ProRes422LT => "apcs",
            VideoCodec::ProRes422Proxy => "apco",
            VideoCodec::ProRes4444 => "ap4h",
            VideoCodec::Jpeg => "jpeg",
            VideoCodec::Other(name) => name,
        }
    }
}

/// Audio formats understood by the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AudioFormat {
    LinearPcm,
    Ac3,
    Ac3Iec60958,
    Mpeg4Aac,
    Mpeg4Celp,
    Mpeg4Hvxc,
    Mpeg4TwinVq,
    Mace3,
    Mace6,
    ULaw,
    ALaw,
    MpegLayer3,
    AppleLossless,
    Mpeg4AacHe,
    Mpeg4AacLd,
    Mpeg4AacEld,
    Mpeg4AacEldSbr,
    Mpeg4AacEldV2,
    Mpeg4AacHeV2,
    Mpeg4AacSpatial,
    MpegDUsac,
    Amr,
    AmrWb,
    Ilbc,
    MicrosoftGsm,
    Aes3,
    EnhancedAc3,
    ParameterValueStream,
}

/// Container file types the writer can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerType {
    Mov,
    Mp4,
    Jpg,
    Wav,
    Ac3,
    M4a,
    Caf,
    Au,
    Mp3,
    Amr,
    Aiff,
    Eac3,
}

impl ContainerType {
    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ContainerType::Mov => "mov",
            ContainerType::Mp4 => "mp4",
            ContainerType::Jpg => "jpg",
            ContainerType::Wav => "wav",
            ContainerType::Ac3 => "ac3",
            ContainerType::M4a => "m4a",
            ContainerType::Caf => "caf",
            ContainerType::Au => "au",
            ContainerType::Mp3 => "mp3",
            ContainerType::Amr => "amr",
            ContainerType::Aiff => "aiff",
            ContainerType::Eac3 => "eac3",
        }
    }

    /// Container for a video codec; `None` when there is no mapping
    pub fn for_video_codec(codec: &VideoCodec) -> Option<Self> {
        match codec {
            VideoCodec::ProRes422
            | VideoCodec::ProRes422HQ
            | VideoCodec::ProRes422LT
            | VideoCodec::ProRes422Proxy
            | VideoCodec::ProRes4444 => Some(ContainerType::Mov),
            VideoCodec::H264 | VideoCodec::Hevc | VideoCodec::HevcWithAlpha => {
                Some(ContainerType::Mp4)
            }
            VideoCodec::Jpeg => Some(ContainerType::Jpg),
            VideoCodec::Other(_) => None,
        }
    }

    /// Container for an audio-only recording; `None` when there is no mapping
    pub fn for_audio_format(format: AudioFormat) -> Option<Self> {
        use AudioFormat::*;
        match format {
            LinearPcm | MicrosoftGsm => Some(ContainerType::Wav),
            Ac3 | Ac3Iec60958 => Some(ContainerType::Ac3),
            Mpeg4Aac | Mpeg4Celp | Mpeg4Hvxc | Mpeg4TwinVq | AppleLossless | Mpeg4AacHe
            | Mpeg4AacLd | Mpeg4AacEld | Mpeg4AacEldSbr | Mpeg4AacEldV2 | Mpeg4AacHeV2
            | Mpeg4AacSpatial | MpegDUsac => Some(ContainerType::M4a),
            Mace3 | Mace6 => Some(ContainerType::Caf),
            ULaw => Some(ContainerType::Au),
            MpegLayer3 => Some(ContainerType::Mp3),
            Amr | AmrWb => Some(ContainerType::Amr),
            Ilbc | Aes3 => Some(ContainerType::Aiff),
            EnhancedAc3 => Some(ContainerType::Eac3),
            ALaw | ParameterValueStream => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScalingMode {
    /// Crop edges, keep aspect, never upscale
    Fit,
    /// Crop edges, stretch to fill
    Resize,
    /// Letterbox
    ResizeAspect,
    /// Crop to fill
    #[default]
    ResizeAspectFill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixelAspectRatio {
    pub horizontal_spacing: u32,
    pub vertical_spacing: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanAperture {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub horizontal_offset: i32,
    #[serde(default)]
    pub vertical_offset: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorPrimaries {
    #[serde(rename = "ITU_R_709_2")]
    ItuR709,
    #[serde(rename = "SMPTE_C")]
    SmpteC,
    #[serde(rename = "P3_D65")]
    P3D65,
    #[serde(rename = "ITU_R_2020")]
    ItuR2020,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferFunction {
    #[serde(rename = "Linear")]
    Linear,
    #[serde(rename = "ITU_R_709_2")]
    ItuR709,
    #[serde(rename = "ITU_R_2100_HLG")]
    ItuR2100Hlg,
    #[serde(rename = "SMPTE_ST_2084_PQ")]
    SmpteSt2084Pq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YCbCrMatrix {
    #[serde(rename = "ITU_R_709_2")]
    ItuR709,
    #[serde(rename = "ITU_R_601_4")]
    ItuR601,
    #[serde(rename = "ITU_R_2020")]
    ItuR2020,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorProperties {
    pub color_primaries: ColorPrimaries,
    pub transfer_function: TransferFunction,
    pub ycbcr_matrix: YCbCrMatrix,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionProperties {
    /// Bits per second (H.264 only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_bit_rate: Option<u64>,
    /// 0.0-1.0, for JPEG and HEIC
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<f32>,
    /// Frames; 1 means key frames only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_key_frame_interval: Option<u32>,
    /// Seconds; 0.0 means no limit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_key_frame_interval_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_frame_reordering: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileLevel {
    H264Baseline30,
    H264Baseline31,
    H264Baseline41,
    H264BaselineAutoLevel,
    H264Main30,
    H264Main31,
    H264Main32,
    H264Main41,
    H264MainAutoLevel,
    H264High40,
    H264High41,
    H264HighAutoLevel,
}

/// Video track encoder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSettings {
    pub codec: VideoCodec,
    /// Use even values for 4:2:0 codecs such as H.264
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub pixel_aspect_ratio: Option<PixelAspectRatio>,
    #[serde(default)]
    pub clean_aperture: Option<CleanAperture>,
    #[serde(default)]
    pub scaling_mode: ScalingMode,
    #[serde(default)]
    pub color_properties: Option<ColorProperties>,
    #[serde(default)]
    pub allow_wide_color: Option<bool>,
    #[serde(default)]
    pub compression_properties: Option<CompressionProperties>,
    #[serde(default)]
    pub profile_level: Option<ProfileLevel>,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            codec: VideoCodec::H264,
            width: 720,
            height: 960,
            pixel_aspect_ratio: None,
            clean_aperture: None,
            scaling_mode: ScalingMode::ResizeAspectFill,
            color_properties: None,
            allow_wide_color: None,
            compression_properties: None,
            profile_level: None,
        }
    }
}

impl VideoSettings {
    /// Key/value settings handed to the encoder, unset keys omitted
    pub fn output_settings(&self) -> Map<String, Value> {
        let mut settings = Map::new();
        settings.insert("codec".into(), Value::from(self.codec.as_str()));
        settings.insert("width".into(), Value::from(self.width));
        settings.insert("height".into(), Value::from(self.height));
        settings.insert("scalingMode".into(), to_value(&self.scaling_mode));
        insert_some(&mut settings, "pixelAspectRatio", &self.pixel_aspect_ratio);
        insert_some(&mut settings, "cleanAperture", &self.clean_aperture);
        insert_some(&mut settings, "colorProperties", &self.color_properties);
        insert_some(&mut settings, "allowWideColor", &self.allow_wide_color);
        insert_some(
            &mut settings,
            "compressionProperties",
            &self.compression_properties,
        );
        insert_some(&mut settings, "profileLevel", &self.profile_level);
        settings
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AudioQuality {
    Min,
    Low,
    Medium,
    High,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EncoderBitRate {
    BitRate(u32),
    BitRatePerChannel(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BitRateStrategy {
    Constant,
    LongTermAverage,
    VariableConstrained,
    Variable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SampleRateConverterAlgorithm {
    Normal,
    Mastering,
    MinimumPhase,
}

/// Audio track encoder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioSettings {
    pub format: AudioFormat,
    /// Hertz
    pub sample_rate: f32,
    pub number_of_channels: u32,

    /// One of 8, 16, 24, 32
    #[serde(default)]
    pub linear_pcm_bit_depth: Option<u32>,
    #[serde(default)]
    pub linear_pcm_is_big_endian: Option<bool>,
    #[serde(default)]
    pub linear_pcm_is_float: Option<bool>,
    #[serde(default)]
    pub linear_pcm_is_non_interleaved: Option<bool>,

    /// Audio file type code used by the encoder
    pub audio_file_type: u32,

    #[serde(default)]
    pub encoder_audio_quality: Option<AudioQuality>,
    /// Only relevant for variable bit rate
    #[serde(default)]
    pub encoder_audio_quality_for_vbr: Option<AudioQuality>,
    #[serde(default)]
    pub encoder_bit_rate: Option<EncoderBitRate>,
    #[serde(default)]
    pub encoder_bit_rate_strategy: Option<BitRateStrategy>,
    /// 8 to 32
    #[serde(default)]
    pub encoder_bit_depth_hint: Option<u32>,
    #[serde(default)]
    pub sample_rate_converter_algorithm: Option<SampleRateConverterAlgorithm>,
    #[serde(default)]
    pub sample_rate_converter_audio_quality: Option<AudioQuality>,
    /// Serialized channel layout
    #[serde(default)]
    pub channel_layout: Option<Vec<u8>>,
}

/// 'm4af', the MPEG-4 audio file type
const MPEG4_AUDIO_FILE_TYPE: u32 = 0x6d34_6166;

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            format: AudioFormat::Mpeg4Aac,
            sample_rate: 44_100.0,
            number_of_channels: 2,
            linear_pcm_bit_depth: None,
            linear_pcm_is_big_endian: None,
            linear_pcm_is_float: None,
            linear_pcm_is_non_interleaved: None,
            audio_file_type: MPEG4_AUDIO_FILE_TYPE,
            encoder_audio_quality: None,
            encoder_audio_quality_for_vbr: None,
            encoder_bit_rate: Some(EncoderBitRate::BitRate(128_000)),
            encoder_bit_rate_strategy: None,
            encoder_bit_depth_hint: None,
            sample_rate_converter_algorithm: None,
            sample_rate_converter_audio_quality: None,
            channel_layout: None,
        }
    }
}

impl AudioSettings {
    /// Key/value settings handed to the encoder, unset keys omitted
    pub fn output_settings(&self) -> Map<String, Value> {
        let mut settings = Map::new();
        settings.insert("format".into(), to_value(&self.format));
        settings.insert("sampleRate".into(), Value::from(self.sample_rate));
        settings.insert(
            "numberOfChannels".into(),
            Value::from(self.number_of_channels),
        );
        settings.insert("audioFileType".into(), Value::from(self.audio_file_type));
        insert_some(&mut settings, "linearPcmBitDepth", &self.linear_pcm_bit_depth);
        insert_some(&mut settings, "linearPcmIsBigEndian", &self.linear_pcm_is_big_endian);
        insert_some(&mut settings, "linearPcmIsFloat", &self.linear_pcm_is_float);
        insert_some(
            &mut settings,
            "linearPcmIsNonInterleaved",
            &self.linear_pcm_is_non_interleaved,
        );
        insert_some(&mut settings, "encoderAudioQuality", &self.encoder_audio_quality);
        insert_some(
            &mut settings,
            "encoderAudioQualityForVbr",
            &self.encoder_audio_quality_for_vbr,
        );
        match self.encoder_bit_rate {
            Some(EncoderBitRate::BitRate(rate)) => {
                settings.insert("encoderBitRate".into(), Value::from(rate));
            }
            Some(EncoderBitRate::BitRatePerChannel(rate)) => {
                settings.insert("encoderBitRatePerChannel".into(), Value::from(rate));
            }
            None => {}
        }
        insert_some(
            &mut settings,
            "encoderBitRateStrategy",
            &self.encoder_bit_rate_strategy,
        );
        insert_some(&mut settings, "encoderBitDepthHint", &self.encoder_bit_depth_hint);
        insert_some(
            &mut settings,
            "sampleRateConverterAlgorithm",
            &self.sample_rate_converter_algorithm,
        );
        insert_some(
            &mut settings,
            "sampleRateConverterAudioQuality",
            &self.sample_rate_converter_audio_quality,
        );
        insert_some(&mut settings, "channelLayout", &self.channel_layout);
        settings
    }
}

/// Settings for recording through the muxing writer.
///
/// Compared structurally: any field change rebuilds or reconfigures the
/// video output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSettings {
    #[serde(default)]
    pub audio: AudioSettings,
    #[serde(default)]
    pub video: VideoSettings,
    /// Container override for codecs without a mapping
    #[serde(default)]
    pub container: Option<ContainerType>,
}

impl RecordingSettings {
    pub fn updating_audio(&self, audio: AudioSettings) -> Self {
        Self {
            audio,
            ..self.clone()
        }
    }

    pub fn updating_video(&self, video: VideoSettings) -> Self {
        Self {
            video,
            ..self.clone()
        }
    }

    /// Container for these settings, or `None` when the caller must supply one
    pub fn container_type(&self) -> Option<ContainerType> {
        self.container
            .or_else(|| ContainerType::for_video_codec(&self.video.codec))
    }
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn insert_some<T: Serialize>(settings: &mut Map<String, Value>, key: &str, value: &Option<T>) {
    if let Some(value) = value {
        settings.insert(key.to_string(), to_value(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_container_lookup() {
        assert_eq!(
            ContainerType::for_video_codec(&VideoCodec::H264),
            Some(ContainerType::Mp4)
        );
        assert_eq!(
            ContainerType::for_video_codec(&VideoCodec::HevcWithAlpha),
            Some(ContainerType::Mp4)
        );
        assert_eq!(
            ContainerType::for_video_codec(&VideoCodec::ProRes422LT),
            Some(ContainerType::Mov)
        );
        assert_eq!(
            ContainerType::for_video_codec(&VideoCodec::Jpeg),
            Some(ContainerType::Jpg)
        );
        assert_eq!(
            ContainerType::for_video_codec(&VideoCodec::Other("vp09".into())),
            None
        );
    }

    #[test]
    fn test_audio_container_lookup() {
        assert_eq!(
            ContainerType::for_audio_format(AudioFormat::LinearPcm),
            Some(ContainerType::Wav)
        );
        assert_eq!(
            ContainerType::for_audio_format(AudioFormat::Mpeg4AacHeV2),
            Some(ContainerType::M4a)
        );
        assert_eq!(
            ContainerType::for_audio_format(AudioFormat::ULaw),
            Some(ContainerType::Au)
        );
        assert_eq!(ContainerType::for_audio_format(AudioFormat::ALaw), None);
        assert_eq!(
            ContainerType::for_audio_format(AudioFormat::EnhancedAc3),
            Some(ContainerType::Eac3)
        );
    }

    #[test]
    fn test_container_override_wins() {
        let settings = RecordingSettings {
            video: VideoSettings {
                codec: VideoCodec::Other("vp09".into()),
                ..VideoSettings::default()
            },
            container: Some(ContainerType::Mov),
            ..RecordingSettings::default()
        };
        assert_eq!(settings.container_type(), Some(ContainerType::Mov));

        let settings = settings.updating_video(VideoSettings {
            codec: VideoCodec::Other("vp09".into()),
            ..VideoSettings::default()
        });
        assert_eq!(settings.container_type(), Some(ContainerType::Mov));

        let settings = RecordingSettings {
            container: None,
            ..settings
        };
        assert_eq!(settings.container_type(), None);
    }

    #[test]
    fn test_output_settings_omit_unset_keys() {
        let video = VideoSettings::default().output_settings();
        assert_eq!(video["codec"], "avc1");
        assert_eq!(video["width"], 720);
        assert_eq!(video["scalingMode"], "resizeAspectFill");
        assert!(!video.contains_key("colorProperties"));

        let audio = AudioSettings::default().output_settings();
        assert_eq!(audio["encoderBitRate"], 128_000);
        assert_eq!(audio["numberOfChannels"], 2);
        assert!(!audio.contains_key("linearPcmBitDepth"));
    }

    #[test]
    fn test_settings_equality_is_structural() {
        let a = RecordingSettings::default();
        let b = a.updating_audio(AudioSettings::default());
        assert_eq!(a, b);

        let c = a.updating_audio(AudioSettings {
            number_of_channels: 1,
            ..AudioSettings::default()
        });
        assert_ne!(a, c);
    }
}
