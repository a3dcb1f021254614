//! Static catalog of every diagnostic the pipeline can produce.
//!
//! Codes are grouped by range: structure E0xx, syntax E1xx, names and types
//! E2xx, loops E4xx, arithmetic E5xx, functions E6xx, collections E7xx,
//! input/output E8xx, critical E9xx. Message templates interpolate
//! `{placeholders}` from the error's detail pairs.

use super::Griffure;

#[derive(Debug)]
pub struct ErrorDef {
    pub code: &'static str,
    pub name: &'static str,
    pub message_tech: &'static str,
    pub message_meow: &'static str,
    pub severity: Griffure,
    pub mood: &'static str,
    pub suggestion: &'static str,
    pub example: &'static str,
}

macro_rules! def {
    ($code:literal, $name:literal, $tech:literal, $meow:literal, $sev:ident, $mood:literal) => {
        def!($code, $name, $tech, $meow, $sev, $mood, "", "")
    };
    ($code:literal, $name:literal, $tech:literal, $meow:literal, $sev:ident, $mood:literal, $sugg:literal) => {
        def!($code, $name, $tech, $meow, $sev, $mood, $sugg, "")
    };
    ($code:literal, $name:literal, $tech:literal, $meow:literal, $sev:ident, $mood:literal, $sugg:literal, $ex:literal) => {
        ErrorDef {
            code: $code,
            name: $name,
            message_tech: $tech,
            message_meow: $meow,
            severity: Griffure::$sev,
            mood: $mood,
            suggestion: $sugg,
            example: $ex,
        }
    };
}

static CATALOG: &[ErrorDef] = &[
    // ----- Structure -----
    def!(
        "E001",
        "ScriptSansMiaou",
        "Le script doit commencer par 'miaou'.",
        "😾 Le chat refuse d'entrer sans un \"miaou\" au début.",
        Forte,
        "😾 En colère, refuse d'entrer.",
        "✔ Ajoute 'miaou' au tout début du fichier",
        "  miaou\n  ecrire \"Bonjour!\"\n  meow"
    ),
    def!(
        "E002",
        "ScriptSansMeow",
        "Le script doit se terminer par 'meow'.",
        "💤 Le chat s'est endormi avant le \"meow\" final.",
        Forte,
        "💤 Endormi, perdu dans ses rêves.",
        "✔ Ajoute 'meow' à la toute fin du fichier",
        "  miaou\n  ecrire \"Bonjour!\"\n  meow"
    ),
    def!(
        "E004",
        "FichierVide",
        "Le fichier est vide.",
        "😿 Le carton est vide.",
        Moyenne,
        "😿 Déçu et triste.",
        "✔ Ajoute du code dans le fichier"
    ),
    // ----- Syntax -----
    def!(
        "E100",
        "InstructionInconnue",
        "Instruction inattendue : {got} (attendu : {expected}).",
        "😿 Le chat ne comprend pas ce mot.",
        Moyenne,
        "😿 Perplexe, tête penchée.",
        "✔ Vérifie l'orthographe de l'instruction\n✔ Consulte la liste des mots-clés valides"
    ),
    def!(
        "E101",
        "MelangeIndentation",
        "Mélange de tabulations et d'espaces dans l'indentation.",
        "😾 Le chat n'aime pas les lignes mal alignées.",
        Moyenne,
        "😾 Agacé par le désordre.",
        "✔ Utilise soit des espaces, soit des tabulations, jamais les deux",
        "  si age > 10 alors:\n      ecrire \"OK\"  # 4 espaces d'indentation"
    ),
    def!(
        "E102",
        "DedentInconnu",
        "Retour à un niveau d'indentation inexistant ({width} espaces).",
        "😾 Le chat est redescendu sur une marche qui n'existe pas.",
        Moyenne,
        "😾 Vexé d'avoir raté la marche.",
        "✔ Aligne la ligne sur un niveau d'indentation déjà ouvert"
    ),
    def!(
        "E103",
        "GuillemetManquant",
        "Guillemet de fermeture manquant pour une chaîne de caractères.",
        "🧶 La pelote de laine n'est pas fermée (guillemet manquant).",
        Moyenne,
        "🧶 Distrait, joue avec la pelote.",
        "✔ Ajoute un guillemet \" à la fin de la chaîne",
        "  texte = \"Bonjour le chat\""
    ),
    def!(
        "E104",
        "MotCleManquant",
        "Mot-clé attendu manquant : {expected}.",
        "🧐 Il manque un mot magique.",
        Moyenne,
        "🧐 Attend quelque chose.",
        "✔ Vérifie la syntaxe complète de l'instruction"
    ),
    def!(
        "E105",
        "DelimiteurManquant",
        "Délimiteur de fermeture manquant : {expected}.",
        "🐈 Une patte dépasse. Il manque une fermeture.",
        Moyenne,
        "🐈 Inconfortable, une patte en l'air.",
        "✔ Vérifie que chaque '(' a son ')', chaque '[' son ']'",
        "  resultat = (3 + 5) * 2"
    ),
    // ----- Names and types -----
    def!(
        "E200",
        "VariableInexistante",
        "Variable '{var_name}' non définie.",
        "🐾 Ce chat '{var_name}' n'existe pas dans la maison.",
        Moyenne,
        "🐾 Cherche partout, ne trouve rien.",
        "✔ Vérifie l'orthographe de la variable\n✔ Définis la variable avant de l'utiliser",
        "  {var_name} = 42\n  ecrire {var_name}"
    ),
    def!(
        "E202",
        "TypeIncompatible",
        "Opération impossible entre types incompatibles : {type1} et {type2}.",
        "🐟 Mauvaise gamelle pour ce repas. Types {type1} et {type2} incompatibles.",
        Moyenne,
        "😿 Dégoûté par la gamelle.",
        "✔ Vérifie les types de tes variables\n✔ Convertis si nécessaire"
    ),
    def!(
        "E203",
        "ConversionImpossible",
        "Impossible de convertir '{value}' en {target_type}.",
        "😾 Impossible de transformer ça en {target_type}.",
        Moyenne,
        "😾 Refuse catégoriquement.",
        "✔ Vérifie que la valeur peut être convertie"
    ),
    def!(
        "E204",
        "AttributInconnu",
        "'{target}' n'a pas de membre '{name}'.",
        "🐾 Le chat a fouillé '{target}' : aucun '{name}' dedans.",
        Moyenne,
        "🐾 A retourné toute la boîte, en vain.",
        "✔ Vérifie le nom du membre\n✔ Seuls les modules importés ont des membres"
    ),
    // ----- Loops -----
    def!(
        "E401",
        "SortieHorsBoucle",
        "'{keyword}' utilisé en dehors d'une boucle.",
        "🚪 Le chat veut sortir d'une pièce où il n'est pas entré.",
        Moyenne,
        "🚪 Confus devant la porte fermée.",
        "✔ Utilise 'stop' et 'suivant' uniquement dans une boucle"
    ),
    // ----- Arithmetic -----
    def!(
        "E501",
        "DivisionParZero",
        "Division par zéro impossible.",
        "🚫 Partager des croquettes entre zéro chat est strictement interdit.",
        Moyenne,
        "😾 Agacé, oreilles en arrière, queue en fouet.",
        "✔ Vérifie que le diviseur est différent de 0\n✔ Ajoute une condition avant le calcul",
        "  si nombre != 0 alors:\n    ecrire 10 / nombre\n  sinon:\n    ecrire \"Même le chat ne peut pas faire ça.\""
    ),
    def!(
        "E502",
        "ComparaisonImpossible",
        "Impossible de comparer {type1} avec {type2}.",
        "🐈 Comparer un chat et un grille-pain est interdit.",
        Moyenne,
        "🙀 Choqué par l'absurdité.",
        "✔ Compare des nombres entre eux ou des textes entre eux"
    ),
    def!(
        "E503",
        "CompteInvalide",
        "Le nombre de répétitions doit être un entier positif, reçu : {count}.",
        "🔢 Le chat ne sait pas répéter ça de fois.",
        Moyenne,
        "🔢 Perdu dans le compte.",
        "✔ Utilise un nombre entier positif après 'repeter'",
        "  repeter 3 fois:\n      ecrire compteur"
    ),
    // ----- Functions -----
    def!(
        "E600",
        "AppelNonFonction",
        "Cette valeur de type {type_name} n'est pas une fonction.",
        "😼 Le chat refuse d'exécuter un tour avec ça.",
        Moyenne,
        "😼 Dubitatif devant l'objet.",
        "✔ Seules les fonctions peuvent être appelées"
    ),
    def!(
        "E601",
        "ArgumentsInvalides",
        "Nombre d'arguments incorrect : attendu {expected}, reçu {received}.",
        "🐾 Le chat attend {expected} caresse(s), pas {received}.",
        Moyenne,
        "🐾 Insatisfait du nombre de caresses.",
        "✔ Vérifie le nombre d'arguments passés à la fonction"
    ),
    def!(
        "E602",
        "RetourHorsFonction",
        "'retour' utilisé en dehors d'une fonction.",
        "👋 Le chat rend une souris que personne n'a demandée.",
        Moyenne,
        "👋 Fier mais incompris.",
        "✔ Utilise 'retour' uniquement dans une fonction"
    ),
    // ----- Collections -----
    def!(
        "E700",
        "IndexHorsLimite",
        "Index {index} hors limites pour une taille de {size}.",
        "🐈 Tu cherches un chat qui n'est pas dans la portée (index {index}).",
        Moyenne,
        "🐈 Cherche dans le vide.",
        "✔ Vérifie que l'index est entre 0 et {size_minus_one}"
    ),
    def!(
        "E701",
        "IterationImpossible",
        "Impossible d'itérer sur une valeur de type {type_name}.",
        "🐾 Le chat ne peut pas faire le tour de ça.",
        Moyenne,
        "🐾 Tourne en rond sans avancer.",
        "✔ 'pour chaque' accepte une liste, un dictionnaire ou un texte"
    ),
    def!(
        "E702",
        "CleIntrouvable",
        "Clé {key} absente du dictionnaire.",
        "🔑 Le chat n'a pas trouvé cette clé sous le tapis.",
        Moyenne,
        "🔑 A soulevé tous les tapis.",
        "✔ Vérifie que la clé existe avant d'y accéder\n✔ 'contient' permet de tester la présence d'une clé"
    ),
    def!(
        "E703",
        "CleInvalide",
        "Une valeur de type {type_name} ne peut pas servir de clé ou d'index.",
        "🔑 Cette clé ne rentre dans aucune serrure.",
        Moyenne,
        "🔑 Gratte à la mauvaise porte.",
        "✔ Les clés de dictionnaire sont des textes, des nombres entiers ou des booléens"
    ),
    // ----- Input/output -----
    def!(
        "E800",
        "TempsNegatif",
        "La durée d'attente ne peut pas être négative : {duration}.",
        "🕰️ Le chat ne peut pas dormir dans le passé.",
        Moyenne,
        "🕰️ Confus par le temps.",
        "✔ Utilise une durée positive pour 'attendre'"
    ),
    def!(
        "E801",
        "OuvertureImpossible",
        "Impossible d'ouvrir le fichier '{path}' : {reason}.",
        "📦 Le chat n'arrive pas à ouvrir ce carton.",
        Moyenne,
        "📦 Griffe le carton sans succès.",
        "✔ Vérifie le chemin du fichier\n✔ Vérifie que le fichier existe"
    ),
    def!(
        "E802",
        "FichierFerme",
        "Le fichier '{path}' est déjà fermé.",
        "📦 Le carton est déjà scellé, le chat ne peut plus rien y lire.",
        Moyenne,
        "📦 Assis sur le carton fermé.",
        "✔ Lis le fichier avant de le fermer"
    ),
    // ----- Critical -----
    def!(
        "E900",
        "FichierIntrouvable",
        "Le fichier '{filename}' est introuvable.",
        "😾 Le chat ne retrouve pas son script '{filename}'.",
        Forte,
        "😾 Énervé, cherche partout.",
        "✔ Vérifie le chemin du fichier\n✔ Vérifie que le fichier existe"
    ),
    def!(
        "E901",
        "ModuleIntrouvable",
        "Le module '{module}' est introuvable.",
        "🗺️ Le chat a perdu la piste du module '{module}'.",
        Forte,
        "🗺️ Flaire le sol sans trouver la trace.",
        "✔ Place '{module}.miaou' à côté du script\n✔ Ou ajoute son dossier à MEOWLANG_PATH"
    ),
    def!(
        "E902",
        "CrashInterpreteur",
        "Erreur interne de l'interpréteur : {reason}.",
        "💥 Le chat a renversé l'interpréteur.",
        Forte,
        "💥 Catastrophe totale.",
        "✔ Ceci est un bug de MeowLang\n✔ Rapporte ce problème avec ton code"
    ),
    def!(
        "E999",
        "ChatAssisSurClavier",
        "Trop d'erreurs détectées. Arrêt.",
        "🐾 Le chat s'est assis sur le clavier. Redémarrage conseillé.",
        Forte,
        "🐾 Confortablement installé sur les touches.",
        "✔ Corrige les erreurs précédentes\n✔ Prends une pause café avec le chat"
    ),
];

/// Looks up a catalog entry by code. Unknown codes resolve to the internal
/// error entry so a bad lookup never panics mid-diagnostic.
pub fn lookup(code: &str) -> &'static ErrorDef {
    CATALOG
        .iter()
        .find(|def| def.code == code)
        .unwrap_or_else(|| {
            CATALOG
                .iter()
                .find(|def| def.code == "E902")
                .expect("catalog always contains E902")
        })
}
