use super::Augmentor;
use crate::error::PipelineError;
use crate::matrix::VOID_LABEL;
use crate::pair::ImageLabelPair;

/// Raw Cityscapes label id -> trainId, for all 34 raw ids. Ids with no
/// trainId (ego vehicle, rectification border, license plate, ...) map to
/// the void sentinel.
const RAW_TO_TRAIN: [u8; 34] = [
    VOID_LABEL, // 0  unlabeled
    VOID_LABEL, // 1  ego vehicle
    VOID_LABEL, // 2  rectification border
    VOID_LABEL, // 3  out of roi
    VOID_LABEL, // 4  static
    VOID_LABEL, // 5  dynamic
    VOID_LABEL, // 6  ground
    0,          // 7  road
    1,          // 8  sidewalk
    VOID_LABEL, // 9  parking
    VOID_LABEL, // 10 rail track
    2,          // 11 building
    3,          // 12 wall
    4,          // 13 fence
    VOID_LABEL, // 14 guard rail
    VOID_LABEL, // 15 bridge
    VOID_LABEL, // 16 tunnel
    5,          // 17 pole
    VOID_LABEL, // 18 polegroup
    6,          // 19 traffic light
    7,          // 20 traffic sign
    8,          // 21 vegetation
    9,          // 22 terrain
    10,         // 23 sky
    11,         // 24 person
    12,         // 25 rider
    13,         // 26 car
    14,         // 27 truck
    15,         // 28 bus
    VOID_LABEL, // 29 caravan
    VOID_LABEL, // 30 trailer
    16,         // 31 train
    17,         // 32 motorcycle
    18,         // 33 bicycle
];

/// Remaps raw Cityscapes label ids (0-33) to the 19-class trainId scheme via
/// a fixed lookup table. Ids already outside `0..34` (e.g. a previously
/// remapped target, or the void sentinel itself) pass through untouched.
/// Image plane untouched.
pub struct CityscapesLabelRemapAugmentor;

impl CityscapesLabelRemapAugmentor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CityscapesLabelRemapAugmentor {
    fn default() -> Self {
        Self::new()
    }
}

impl Augmentor for CityscapesLabelRemapAugmentor {
    fn augment(&self, pair: &mut ImageLabelPair) -> Result<(), PipelineError> {
        for y in 0..pair.target.height() {
            for x in 0..pair.target.width() {
                let raw = pair.target.get(y, x);
                if let Some(&mapped) = RAW_TO_TRAIN.get(raw as usize) {
                    pair.target.set(y, x, mapped);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{ImageMatrix, LabelMatrix};

    #[test]
    fn remaps_known_ids() {
        let aug = CityscapesLabelRemapAugmentor::new();
        let mut target = LabelMatrix::filled(1, 3, 0);
        target.set(0, 0, 7); // road -> 0
        target.set(0, 1, 26); // car -> 13
        target.set(0, 2, 0); // unlabeled -> void

        let mut pair = ImageLabelPair::new(ImageMatrix::zeros(1, 3), target);
        aug.augment(&mut pair).unwrap();
        assert_eq!(pair.target.get(0, 0), 0);
        assert_eq!(pair.target.get(0, 1), 13);
        assert_eq!(pair.target.get(0, 2), VOID_LABEL);
    }

    #[test]
    fn out_of_table_ids_pass_through() {
        let aug = CityscapesLabelRemapAugmentor::new();
        let mut target = LabelMatrix::filled(1, 1, VOID_LABEL);
        target.set(0, 0, VOID_LABEL);
        let mut pair = ImageLabelPair::new(ImageMatrix::zeros(1, 1), target);
        aug.augment(&mut pair).unwrap();
        assert_eq!(pair.target.get(0, 0), VOID_LABEL);
    }

    #[test]
    fn image_plane_untouched() {
        let aug = CityscapesLabelRemapAugmentor::new();
        let mut image = ImageMatrix::zeros(1, 1);
        image.set(0, 0, [0.4, 0.5, 0.6]);
        let before = image.clone();
        let mut pair = ImageLabelPair::new(image, LabelMatrix::filled(1, 1, 7));
        aug.augment(&mut pair).unwrap();
        assert_eq!(pair.image, before);
    }
}
