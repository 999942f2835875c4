pub const ADJECTIVES: &[&str] = &[
    "Able", "Agile", "Amber", "Bold", "Brave", "Breezy", "Bright", "Brisk",
    "Calm", "Chill", "Clever", "Cosmic", "Crafty", "Crisp", "Curious", "Daring",
    "Dapper", "Eager", "Fancy", "Fierce", "Fluffy", "Frosty", "Gentle", "Giddy",
    "Golden", "Grand", "Happy", "Hasty", "Humble", "Jolly", "Keen", "Kind",
    "Lively", "Lucky", "Mellow", "Merry", "Mighty", "Misty", "Nimble", "Noble",
    "Peppy", "Plucky", "Proud", "Quick", "Quiet", "Rapid", "Rusty", "Shiny",
    "Silent", "Sleepy", "Sly", "Snappy", "Spicy", "Steady", "Sunny", "Swift",
    "Tidy", "Witty", "Zany", "Zesty",
];

pub const ANIMALS: &[&str] = &[
    "Ant", "Badger", "Bat", "Bear", "Beaver", "Bee", "Bison", "Boar",
    "Camel", "Cat", "Crab", "Crane", "Crow", "Deer", "Dingo", "Dog",
    "Dove", "Duck", "Eagle", "Eel", "Elk", "Emu", "Falcon", "Ferret",
    "Finch", "Fox", "Frog", "Gecko", "Goat", "Goose", "Hare", "Hawk",
    "Heron", "Ibis", "Koala", "Lark", "Lemur", "Lion", "Llama", "Lynx",
    "Mole", "Moose", "Moth", "Newt", "Otter", "Owl", "Panda", "Puffin",
    "Quail", "Raven", "Seal", "Shark", "Sloth", "Snail", "Swan", "Tapir",
    "Tiger", "Toad", "Trout", "Wolf", "Wombat", "Yak", "Zebra",
];

pub const WORDS: &[&str] = &[
    "a", "about", "after", "again", "all", "always", "and", "anyone",
    "are", "back", "because", "been", "before", "but", "can", "coffee",
    "could", "day", "did", "do", "does", "done", "else", "even",
    "every", "feel", "few", "find", "first", "for", "from", "fun",
    "get", "give", "going", "good", "great", "had", "has", "have",
    "here", "how", "i", "idea", "if", "in", "is", "it",
    "just", "know", "last", "like", "little", "long", "look", "lunch",
    "make", "maybe", "me", "more", "most", "much", "my", "need",
    "never", "new", "nice", "night", "no", "not", "now", "of",
    "ok", "on", "one", "only", "or", "other", "our", "out",
    "people", "really", "right", "said", "same", "see", "should", "so",
    "some", "soon", "still", "sure", "than", "that", "the", "them",
    "then", "there", "think", "this", "time", "to", "today", "too",
    "try", "up", "us", "very", "want", "was", "way", "we",
    "weekend", "well", "what", "when", "where", "which", "who", "why",
    "will", "with", "work", "would", "yeah", "yes", "you", "your",
];

pub const EMOJIS: &[char] = &[
    '😀', '😂', '😅', '😉', '😎', '🤔', '🙃', '😴',
    '👍', '👋', '🙌', '🎉', '🔥', '✨', '☕', '🍕',
];
