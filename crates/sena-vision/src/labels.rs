//! Static class-id naming and the Indonesian announcement vocabulary.

/// Standard 80-class detection taxonomy, indexed by class id.
pub const CLASS_NAMES: [&str; 80] = [
    "person",
    "bicycle",
    "car",
    "motorbike",
    "aeroplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "sofa",
    "pottedplant",
    "bed",
    "diningtable",
    "toilet",
    "tvmonitor",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

pub fn class_name(class_id: i64) -> Option<&'static str> {
    usize::try_from(class_id)
        .ok()
        .and_then(|i| CLASS_NAMES.get(i))
        .copied()
}

/// Indonesian pronunciation table, keyed by lowercase English name.
pub fn indonesian_name(english: &str) -> Option<&'static str> {
    let name = match english {
        "person" => "manusia",
        "bicycle" => "sepeda",
        "car" => "mobil",
        "motorbike" => "sepeda motor",
        "aeroplane" => "pesawat",
        "bus" => "bis",
        "train" => "kereta api",
        "truck" => "truk",
        "boat" => "kapal",
        "traffic light" => "lampu lalu lintas",
        "fire hydrant" => "hidran",
        "stop sign" => "rambu berhenti",
        "parking meter" => "parkir meter",
        "bench" => "bangku",
        "bird" => "burung",
        "cat" => "kucing",
        "dog" => "anjing",
        "horse" => "kuda",
        "sheep" => "domba",
        "cow" => "sapi",
        "elephant" => "gajah",
        "bear" => "beruang",
        "zebra" => "zebra",
        "giraffe" => "jerapah",
        "backpack" => "tas",
        "umbrella" => "payung",
        "handbag" => "tas tangan",
        "tie" => "dasi",
        "suitcase" => "koper",
        "frisbee" => "frisbee",
        "skis" => "ski",
        "snowboard" => "papan salju",
        "sports ball" => "bola",
        "kite" => "layang layang",
        "baseball bat" => "tongkat baseball",
        "baseball glove" => "sarung tangan baseball",
        "skateboard" => "papan luncur",
        "surfboard" => "papan selancar",
        "tennis racket" => "raket tenis",
        "bottle" => "botol",
        "wine glass" => "gelas wine",
        "cup" => "gelas",
        "fork" => "garpu",
        "knife" => "pisau",
        "spoon" => "sendok",
        "bowl" => "mangkuk",
        "banana" => "pisang",
        "apple" => "apel",
        "sandwich" => "sandwich",
        "orange" => "jeruk",
        "broccoli" => "brokoli",
        "carrot" => "wortel",
        "hot dog" => "hot dog",
        "pizza" => "pizza",
        "donut" => "donat",
        "cake" => "kue",
        "chair" => "kursi",
        "sofa" => "sofa",
        "pottedplant" => "tanaman pot",
        "bed" => "tempat tidur",
        "diningtable" => "meja makan",
        "toilet" => "toilet",
        "tvmonitor" => "televisi",
        "laptop" => "laptop",
        "mouse" => "mouse komputer",
        "remote" => "remote",
        "keyboard" => "keyboard",
        "cell phone" => "telepon",
        "microwave" => "microwave",
        "oven" => "oven",
        "toaster" => "pemanggang roti",
        "sink" => "wastafel",
        "refrigerator" => "kulkas",
        "book" => "buku",
        "clock" => "jam",
        "vase" => "vas",
        "scissors" => "gunting",
        "teddy bear" => "boneka beruang",
        "hair drier" => "pengering rambut",
        "toothbrush" => "sikat gigi",
        "wall" => "tembok",
        "obstacle" => "halangan",
        _ => return None,
    };
    Some(name)
}

/// Translate a hazard label for announcement. Obstacle-tagged labels keep
/// the "halangan" suffix; unmapped names pass through unchanged.
pub fn localize_label(label: &str) -> String {
    if let Some(main) = label.strip_suffix(" / obstacle") {
        let lower = main.to_lowercase();
        let translated = indonesian_name(&lower).unwrap_or(main);
        return format!("{translated} halangan");
    }
    let lower = label.to_lowercase();
    match indonesian_name(&lower) {
        Some(id) => id.to_string(),
        None => label.to_string(),
    }
}

pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
